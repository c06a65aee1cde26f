//! In-memory document store
//!
//! Keeps each collection as an insertion-ordered vector behind a tokio
//! `RwLock`. Used by the integration tests and for local runs without a
//! database (`STORE_BACKEND=memory`).

use async_trait::async_trait;
use cinedex_core::{CinedexError, Result};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{DocumentStore, Filter};

type Documents = Vec<(String, Value)>;

/// Document store held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Documents>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Shallow merge of `patch` into `target`, key by key
fn merge(target: &mut Value, patch: Value) -> Result<()> {
    let (Some(target), Value::Object(patch)) = (target.as_object_mut(), patch) else {
        return Err(CinedexError::ValidationError(
            "documents and patches must be JSON objects".to_string(),
        ));
    };
    target.extend(patch);
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, key: &str, document: Value) -> Result<()> {
        if !document.is_object() {
            return Err(CinedexError::ValidationError(
                "documents must be JSON objects".to_string(),
            ));
        }

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        if documents.iter().any(|(k, _)| k == key) {
            return Err(CinedexError::Duplicate(format!("{collection}:{key}")));
        }
        documents.push((key.to_string(), document));
        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|(k, _)| k == key))
            .map(|(_, doc)| doc.clone()))
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>> {
        filter.validate()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|(_, doc)| filter.matches(doc)))
            .map(|(_, doc)| doc.clone()))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        filter.validate()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(_, doc)| doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        filter.validate()?;
        let collections = self.collections.read().await;
        let total = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|(_, doc)| filter.matches(doc)).count())
            .unwrap_or(0);
        Ok(total as u64)
    }

    async fn update(&self, collection: &str, key: &str, patch: Value) -> Result<Option<Value>> {
        let mut collections = self.collections.write().await;
        let Some(document) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(k, _)| k == key))
            .map(|(_, doc)| doc)
        else {
            return Ok(None);
        };

        merge(document, patch)?;
        Ok(Some(document.clone()))
    }

    async fn upsert(&self, collection: &str, key: &str, patch: Value) -> Result<Value> {
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();

        if let Some((_, document)) = documents.iter_mut().find(|(k, _)| k == key) {
            merge(document, patch)?;
            return Ok(document.clone());
        }

        let mut document = Value::Object(serde_json::Map::new());
        merge(&mut document, patch)?;
        documents.push((key.to_string(), document.clone()));
        Ok(document)
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = documents.len();
        documents.retain(|(k, _)| k != key);
        Ok(documents.len() < before)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
