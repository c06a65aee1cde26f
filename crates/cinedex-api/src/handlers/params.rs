//! Shared query parameters
//!
//! Author: hephaex@gmail.com

use cinedex_store::PageWindow;
use serde::Deserialize;
use utoipa::IntoParams;

/// Pagination query parameters
///
/// Kept as raw strings so a bad value falls back to its default instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Items per page (default 10)
    #[serde(rename = "recordPerPage")]
    pub record_per_page: Option<String>,

    /// 1-based page number (default 1)
    pub page: Option<String>,

    /// Explicit offset, overrides the one computed from `page`
    #[serde(rename = "startIndex")]
    pub start_index: Option<String>,
}

impl PageQuery {
    pub fn window(&self) -> PageWindow {
        PageWindow::from_query(
            self.record_per_page.as_deref(),
            self.page.as_deref(),
            self.start_index.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(raw: &str) -> PageQuery {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_wire_names() {
        let window = query(r#"{"recordPerPage": "5", "page": "3"}"#).window();
        assert_eq!(window.record_per_page, 5);
        assert_eq!(window.start_index, 10);

        let window = query(r#"{"startIndex": "7"}"#).window();
        assert_eq!(window.record_per_page, 10);
        assert_eq!(window.start_index, 7);
    }

    #[test]
    fn test_garbage_falls_back() {
        let window = query(r#"{"recordPerPage": "many", "page": "-2", "startIndex": "x"}"#).window();
        assert_eq!(window, PageWindow::default());
    }
}
