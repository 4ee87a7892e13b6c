//! No-op document store: disables retrieval entirely.

use async_trait::async_trait;
use baton_core::document::{Document, DocumentQuery, DocumentStore};
use baton_core::error::StoreError;

/// A document store that keeps nothing and finds nothing.
pub struct NoopStore;

#[async_trait]
impl DocumentStore for NoopStore {
    fn name(&self) -> &str { "none" }

    async fn extend(&self, _collection: &str, _documents: Vec<Document>) -> Result<(), StoreError> {
        Ok(())
    }

    async fn query(&self, _query: DocumentQuery) -> Result<Vec<Document>, StoreError> {
        Ok(Vec::new())
    }

    async fn count(&self, _collection: &str) -> Result<usize, StoreError> {
        Ok(0)
    }
}
