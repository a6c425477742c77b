//! Document store client.
//!
//! The external document store is a remote key-document database: collections
//! of JSON documents addressed by string keys, with simple equality queries.
//! Everything non-trivial (durability, indexing, query execution) lives on
//! the remote side; this module is a thin typed client over its REST API plus
//! an in-process implementation for tests and local development.

mod http;
mod memory;

pub use http::HttpDocumentStore;
pub use memory::MemoryDocumentStore;

use async_trait::async_trait;

use expressly_core::BackendError;

/// The JSON field map of a stored document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A document retrieved from the store.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    /// Document key within its collection.
    pub id: String,
    /// Stored field map.
    pub fields: Fields,
}

/// Client interface to the external document store.
///
/// All failures are reported as [`BackendError::Store`] (the remote side
/// rejected the operation) or [`BackendError::Network`] (the request never
/// completed).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write a document. With `merge` set, existing fields not present in
    /// `fields` are preserved; otherwise the document is replaced. Creates
    /// the document if it does not exist.
    async fn set_document(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
        merge: bool,
    ) -> Result<(), BackendError>;

    /// Fetch a document, or `None` if it does not exist.
    async fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, BackendError>;

    /// Merge `fields` into an existing document. Unlike [`set_document`],
    /// this fails if the document does not exist.
    ///
    /// [`set_document`]: DocumentStore::set_document
    async fn update_document(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
    ) -> Result<(), BackendError>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete_document(&self, collection: &str, key: &str) -> Result<(), BackendError>;

    /// All documents in `collection` whose `field` equals `value` exactly.
    async fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<Vec<Document>, BackendError>;

    /// All documents in `collection`, in stable key order.
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, BackendError>;
}
