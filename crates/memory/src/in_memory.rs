//! In-memory document store: useful for testing and ephemeral sessions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use baton_core::document::{Document, DocumentQuery, DocumentStore};
use baton_core::error::StoreError;
use tokio::sync::RwLock;
use tracing::debug;

use crate::ranking::rank;

/// Documents grouped by collection name.
pub(crate) type Collections = HashMap<String, Vec<Document>>;

/// Insert `documents` into `collection`, replacing any document that
/// already carries the same ID.
pub(crate) fn upsert(collections: &mut Collections, collection: &str, documents: Vec<Document>) {
    let docs = collections.entry(collection.to_string()).or_default();
    for document in documents {
        match docs.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => docs.push(document),
        }
    }
}

/// A document store that keeps every collection in a `HashMap`.
pub struct InMemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn name(&self) -> &str { "in_memory" }

    async fn extend(&self, collection: &str, documents: Vec<Document>) -> Result<(), StoreError> {
        let added = documents.len();
        upsert(&mut *self.collections.write().await, collection, documents);
        debug!(collection, added, "Documents stored");
        Ok(())
    }

    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&query.collection)
            .map(|docs| rank(docs, &query))
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len))
    }
}
