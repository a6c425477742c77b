//! In-process document store.
//!
//! Implements [`DocumentStore`] over a `HashMap`, with the same observable
//! semantics as the HTTP client. Used by unit tests and for running the site
//! locally without backend credentials.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;

use expressly_core::BackendError;

use super::{Document, DocumentStore, Fields};

type Collections = HashMap<String, BTreeMap<String, Fields>>;

/// An in-memory [`DocumentStore`].
///
/// Clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Whether `collection` holds no documents.
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn set_document(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
        merge: bool,
    ) -> Result<(), BackendError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if merge {
            docs.entry(key.to_string()).or_default().extend(fields);
        } else {
            docs.insert(key.to_string(), fields);
        }
        Ok(())
    }

    async fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, BackendError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .map(|fields| Document {
                id: key.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn update_document(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
    ) -> Result<(), BackendError> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(key))
            .ok_or_else(|| BackendError::Store(format!("document not found: {collection}/{key}")))?;

        existing.extend(fields);
        Ok(())
    }

    async fn delete_document(&self, collection: &str, key: &str) -> Result<(), BackendError> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(key);
        }
        Ok(())
    }

    async fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<Vec<Document>, BackendError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| fields.get(field) == Some(value))
                    .map(|(key, fields)| Document {
                        id: key.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, BackendError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(key, fields)| Document {
                        id: key.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
