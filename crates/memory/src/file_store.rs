//! File-based document store: persistent JSON-lines storage.
//!
//! Each line is one document tagged with its collection:
//! `{"collection":"default","content":"...","id":"...","metadata":{...}}`.
//! The whole file is loaded on creation and rewritten on every mutation,
//! which keeps reads fast and the file human-inspectable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use baton_core::document::{Document, DocumentQuery, DocumentStore};
use baton_core::error::StoreError;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::in_memory::{Collections, upsert};
use crate::ranking::rank;

#[derive(Serialize, Deserialize)]
struct StoredDocument {
    collection: String,
    #[serde(flatten)]
    document: Document,
}

/// A file-backed document store using JSONL (one JSON object per line).
pub struct FileStore {
    path: PathBuf,
    collections: Arc<RwLock<Collections>>,
}

impl FileStore {
    /// Open a store at `path`.
    ///
    /// An existing file is loaded; a missing one starts empty and is created
    /// on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let collections = Self::load_from_disk(&path);
        debug!(
            path = %path.display(),
            collections = collections.len(),
            "File document store loaded"
        );
        Self {
            path,
            collections: Arc::new(RwLock::new(collections)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> Collections {
        let mut collections = Collections::new();
        let Ok(content) = std::fs::read_to_string(path) else {
            return collections;
        };

        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<StoredDocument>(line) {
                Ok(stored) => {
                    upsert(&mut collections, &stored.collection, vec![stored.document])
                }
                Err(e) => warn!(error = %e, "Skipping corrupted document line"),
            }
        }
        collections
    }

    /// Rewrite the file from the current state.
    async fn flush(&self) -> Result<(), StoreError> {
        let collections = self.collections.read().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Storage(format!("Failed to create document directory: {e}"))
            })?;
        }

        let mut names: Vec<&String> = collections.keys().collect();
        names.sort();

        let mut content = String::new();
        for name in names {
            for document in &collections[name] {
                let line = serde_json::to_string(&StoredDocument {
                    collection: name.clone(),
                    document: document.clone(),
                })
                .map_err(|e| StoreError::Storage(format!("Failed to serialize document: {e}")))?;
                content.push_str(&line);
                content.push('\n');
            }
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| StoreError::Storage(format!("Failed to write document file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    fn name(&self) -> &str { "file" }

    async fn extend(&self, collection: &str, documents: Vec<Document>) -> Result<(), StoreError> {
        let added = documents.len();
        upsert(&mut *self.collections.write().await, collection, documents);
        self.flush().await?;
        debug!(collection, added, path = %self.path.display(), "Documents persisted");
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_path() -> PathBuf {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);
        path
    }

    #[tokio::test]
    async fn append_persists() {
        let path = temp_path();
        let store = FileStore::new(&path);
        store
            .append("default", Document::new("Rust is great").with_id("r1"))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Rust is great"));
        assert!(content.contains("\"collection\":\"default\""));

        let reopened = FileStore::new(&path);
        let found = reopened.query_text("rust", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "r1");
    }

    #[tokio::test]
    async fn collections_persist_separately() {
        let path = temp_path();
        let store = FileStore::new(&path);
        store.append("a", Document::new("first")).await.unwrap();
        store
            .extend("b", vec![Document::new("second"), Document::new("third")])
            .await
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.count("a").await.unwrap(), 1);
        assert_eq!(reopened.count("b").await.unwrap(), 2);
        assert_eq!(reopened.count("default").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("docs.jsonl");
        let store = FileStore::new(&path);
        store.append("default", Document::new("hello")).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn handles_missing_file_gracefully() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.jsonl"));
        assert_eq!(store.count("default").await.unwrap(), 0);
        assert!(store.query_text("anything", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn handles_corrupted_lines() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, r#"{{"collection":"default","content":"valid","id":"1"}}"#).unwrap();
        writeln!(tmp, "this is not json").unwrap();
        writeln!(tmp, r#"{{"collection":"default","content":"also valid","id":"2","metadata":{{"k":1}}}}"#).unwrap();

        let store = FileStore::new(tmp.path());
        assert_eq!(store.count("default").await.unwrap(), 2);
    }
}
