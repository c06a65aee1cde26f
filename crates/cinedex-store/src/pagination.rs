//! Pagination engine
//!
//! Every list endpoint goes through here: count the documents matching a
//! filter, materialize them in insertion order, then slice the requested
//! window out of the result.
//!
//! Author: hephaex@gmail.com

use cinedex_core::{CinedexError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{DocumentStore, Filter};

pub const DEFAULT_RECORDS_PER_PAGE: u64 = 10;
pub const DEFAULT_PAGE: u64 = 1;

/// Requested slice of a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub record_per_page: u64,
    pub page: u64,
    pub start_index: u64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(DEFAULT_RECORDS_PER_PAGE, DEFAULT_PAGE)
    }
}

impl PageWindow {
    /// Window for `page` (1-based) of `record_per_page` items.
    /// Zero values fall back to the defaults.
    pub fn new(record_per_page: u64, page: u64) -> Self {
        let record_per_page = if record_per_page == 0 {
            DEFAULT_RECORDS_PER_PAGE
        } else {
            record_per_page
        };
        let page = if page == 0 { DEFAULT_PAGE } else { page };

        Self {
            record_per_page,
            page,
            start_index: (page - 1).saturating_mul(record_per_page),
        }
    }

    /// Build a window from raw query string values.
    ///
    /// `record_per_page` and `page` each fall back to their default when
    /// absent, non-numeric or below 1. A `start_index` that parses as a
    /// non-negative integer replaces the computed offset; anything else is
    /// ignored.
    pub fn from_query(
        record_per_page: Option<&str>,
        page: Option<&str>,
        start_index: Option<&str>,
    ) -> Self {
        let window = Self::new(
            parse_positive(record_per_page).unwrap_or(DEFAULT_RECORDS_PER_PAGE),
            parse_positive(page).unwrap_or(DEFAULT_PAGE),
        );

        match start_index.and_then(|raw| raw.trim().parse::<u64>().ok()) {
            Some(start) => window.with_start_index(start),
            None => window,
        }
    }

    pub fn with_start_index(mut self, start_index: u64) -> Self {
        self.start_index = start_index;
        self
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .map(|n| n as u64)
}

/// One page of results plus the size of the whole result set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResult<T> {
    pub total_count: u64,
    pub items: Vec<T>,
}

impl<T> PaginatedResult<T> {
    pub fn empty() -> Self {
        Self {
            total_count: 0,
            items: Vec::new(),
        }
    }

    /// True when nothing matched the filter at all
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            total_count: self.total_count,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Count, materialize and slice the documents of `collection` matching `filter`.
///
/// The slice is `[start_index, start_index + record_per_page)` clamped to the
/// number of matches, so a window past the end yields no items. No matches
/// at all is `{0, []}`, not an error.
pub async fn paginate<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    filter: &Filter,
    window: PageWindow,
) -> Result<PaginatedResult<T>> {
    let total_count = store.count(collection, filter).await?;
    if total_count == 0 {
        return Ok(PaginatedResult::empty());
    }

    let documents = store.find(collection, filter).await?;
    let start = usize::try_from(window.start_index).unwrap_or(usize::MAX);
    let size = usize::try_from(window.record_per_page).unwrap_or(usize::MAX);

    let items = documents
        .into_iter()
        .skip(start)
        .take(size)
        .map(|doc| serde_json::from_value(doc).map_err(CinedexError::from))
        .collect::<Result<Vec<T>>>()?;

    tracing::debug!(
        collection,
        total_count,
        start_index = window.start_index,
        returned = items.len(),
        "Paginated query"
    );

    Ok(PaginatedResult { total_count, items })
}
