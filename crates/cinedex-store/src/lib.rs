//! Cinedex Store - Document store abstraction
//!
//! Provides collection-oriented JSON document persistence over SurrealDB
//! (or an in-memory map for tests and local development), typed collection
//! handles with per-call deadlines, and the pagination engine shared by
//! every list endpoint.

use async_trait::async_trait;
use cinedex_core::Result;
use serde_json::Value;

pub mod collection;
pub mod filter;
pub mod memory;
pub mod pagination;
pub mod surreal;

pub use collection::{with_deadline, Collection};
pub use filter::{Condition, Filter};
pub use memory::MemoryDocumentStore;
pub use pagination::{paginate, PageWindow, PaginatedResult};
pub use surreal::SurrealDocumentStore;

/// Trait for document store operations
///
/// Documents are JSON objects addressed by a string key inside a named
/// collection. Lookups that return several documents yield them in
/// insertion order.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document. Fails with `Duplicate` if the key is taken.
    async fn insert(&self, collection: &str, key: &str, document: Value) -> Result<()>;

    /// Get a document by key
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>>;

    /// First document matching the filter
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>>;

    /// All documents matching the filter
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>>;

    /// Number of documents matching the filter
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Merge `patch` into an existing document. Returns `None` if the key is absent.
    async fn update(&self, collection: &str, key: &str, patch: Value) -> Result<Option<Value>>;

    /// Merge `patch` into the document, creating it if absent
    async fn upsert(&self, collection: &str, key: &str, patch: Value) -> Result<Value>;

    /// Delete a document. Returns whether anything was removed.
    async fn delete(&self, collection: &str, key: &str) -> Result<bool>;

    /// Check connectivity
    async fn ping(&self) -> Result<()>;
}
