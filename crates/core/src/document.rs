//! Document store trait: the retrieval side of generation.
//!
//! The engine only ever asks a store for the documents most similar to a
//! query. How documents are indexed, embedded or persisted is up to the
//! implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Name of the collection used when none is given.
pub const DEFAULT_COLLECTION: &str = "default";

/// A unit of storage in a document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The text content of the document
    pub content: String,

    /// Unique ID; generated when the document is created without one
    pub id: String,

    /// Arbitrary key/values stored alongside the content
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// Create a document with a fresh UUID.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            id: uuid::Uuid::new_v4().to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A similarity query against a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentQuery {
    /// A single query text, searched ahead of `texts`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Additional query texts
    #[serde(default)]
    pub texts: Vec<String>,

    /// Maximum number of results
    #[serde(default = "default_result_count")]
    pub result_count: usize,

    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_result_count() -> usize {
    10
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.into()
}

impl DocumentQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_result_count(mut self, result_count: usize) -> Self {
        self.result_count = result_count;
        self
    }

    pub fn in_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// All query texts, `text` first.
    pub fn query_texts(&self) -> Vec<&str> {
        self.text
            .iter()
            .chain(self.texts.iter())
            .map(String::as_str)
            .collect()
    }
}

impl Default for DocumentQuery {
    fn default() -> Self {
        Self {
            text: None,
            texts: Vec::new(),
            result_count: default_result_count(),
            collection: default_collection(),
        }
    }
}

/// The core DocumentStore trait.
///
/// Implementations: in-memory, JSON-lines file, none (no-op).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The store name (e.g., "in_memory", "file", "none").
    fn name(&self) -> &str;

    /// Add documents to a collection.
    async fn extend(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> std::result::Result<(), StoreError>;

    /// Return up to `query.result_count` documents, most similar first.
    async fn query(&self, query: DocumentQuery)
    -> std::result::Result<Vec<Document>, StoreError>;

    /// Number of documents in a collection.
    async fn count(&self, collection: &str) -> std::result::Result<usize, StoreError>;

    /// Add a single document to a collection.
    async fn append(
        &self,
        collection: &str,
        document: Document,
    ) -> std::result::Result<(), StoreError> {
        self.extend(collection, vec![document]).await
    }

    /// Query the default collection with a single text.
    async fn query_text(
        &self,
        text: &str,
        result_count: usize,
    ) -> std::result::Result<Vec<Document>, StoreError> {
        self.query(DocumentQuery::text(text).with_result_count(result_count))
            .await
    }
}
