//! Typed collection handles
//!
//! A `Collection<T>` binds a shared `DocumentStore` to one collection name
//! and a record type, encodes and decodes records with serde, and bounds
//! every call with a deadline.
//!
//! Author: hephaex@gmail.com

use cinedex_core::{CinedexError, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::pagination::{paginate, PageWindow, PaginatedResult};
use crate::{DocumentStore, Filter};

/// Run `fut`, failing with `DeadlineExceeded` if it does not finish within `limit`.
///
/// Only the future is dropped on timeout; nothing else is cancelled.
pub async fn with_deadline<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "Store deadline exceeded"
            );
            Err(CinedexError::DeadlineExceeded {
                operation: operation.to_string(),
                after_secs: limit.as_secs(),
            })
        }
    }
}

/// Typed handle on one collection
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    name: &'static str,
    timeout: Duration,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: self.name,
            timeout: self.timeout,
            _record: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    pub fn new(store: Arc<dyn DocumentStore>, name: &'static str, timeout: Duration) -> Self {
        Self {
            store,
            name,
            timeout,
            _record: PhantomData,
        }
    }

    /// Same collection with a different deadline
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn operation(&self, verb: &str) -> String {
        format!("{verb} {}", self.name)
    }

    pub async fn insert(&self, key: &str, record: &T) -> Result<()> {
        let document = serde_json::to_value(record)?;
        with_deadline(
            self.timeout,
            &self.operation("insert"),
            self.store.insert(self.name, key, document),
        )
        .await
    }

    pub async fn get(&self, key: &str) -> Result<Option<T>> {
        let document = with_deadline(
            self.timeout,
            &self.operation("get"),
            self.store.get(self.name, key),
        )
        .await?;
        decode_optional(document)
    }

    /// Like `get`, but a missing record is `NotFound` naming the key
    pub async fn require(&self, key: &str) -> Result<T> {
        self.get(key)
            .await?
            .ok_or_else(|| CinedexError::NotFound(format!("{} {key}", self.name)))
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<T>> {
        let document = with_deadline(
            self.timeout,
            &self.operation("find"),
            self.store.find_one(self.name, filter),
        )
        .await?;
        decode_optional(document)
    }

    pub async fn find(&self, filter: &Filter) -> Result<Vec<T>> {
        let documents = with_deadline(
            self.timeout,
            &self.operation("find"),
            self.store.find(self.name, filter),
        )
        .await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(CinedexError::from))
            .collect()
    }

    pub async fn exists(&self, filter: &Filter) -> Result<bool> {
        let total = with_deadline(
            self.timeout,
            &self.operation("count"),
            self.store.count(self.name, filter),
        )
        .await?;
        Ok(total > 0)
    }

    /// Merge `patch` into the record stored under `key`
    pub async fn update(&self, key: &str, patch: Value) -> Result<Option<T>> {
        let document = with_deadline(
            self.timeout,
            &self.operation("update"),
            self.store.update(self.name, key, patch),
        )
        .await?;
        decode_optional(document)
    }

    /// Merge `patch` into the record stored under `key`, creating it if absent
    pub async fn upsert(&self, key: &str, patch: Value) -> Result<Value> {
        with_deadline(
            self.timeout,
            &self.operation("upsert"),
            self.store.upsert(self.name, key, patch),
        )
        .await
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        with_deadline(
            self.timeout,
            &self.operation("delete"),
            self.store.delete(self.name, key),
        )
        .await
    }

    /// Count, materialize and slice the records matching `filter`
    pub async fn paginate(&self, filter: &Filter, window: PageWindow) -> Result<PaginatedResult<T>> {
        with_deadline(
            self.timeout,
            &self.operation("paginate"),
            paginate(self.store.as_ref(), self.name, filter, window),
        )
        .await
    }
}

fn decode_optional<T: DeserializeOwned>(document: Option<Value>) -> Result<Option<T>> {
    document
        .map(|doc| serde_json::from_value(doc).map_err(CinedexError::from))
        .transpose()
}
