//! HTTP client for the document store's REST API.
//!
//! # Wire format
//!
//! Documents live under `/v1/{collection}/{key}` and carry a flat JSON field
//! map. Collections support `GET /v1/{collection}` (full listing) and
//! `POST /v1/{collection}:query` with `{"field": ..., "equals": ...}` for
//! equality queries. Errors come back as `{"error": {"message": ...}}`; the
//! message is surfaced verbatim.

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use expressly_core::BackendError;

use crate::config::DocumentStoreConfig;

use super::{Document, DocumentStore, Fields};

/// Error envelope returned by the store on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    field: &'a str,
    equals: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    documents: Vec<Document>,
}

/// Client for the document store's REST API.
#[derive(Clone)]
pub struct HttpDocumentStore {
    inner: Arc<HttpDocumentStoreInner>,
}

struct HttpDocumentStoreInner {
    client: reqwest::Client,
    base_url: String,
    api_token: SecretString,
}

impl HttpDocumentStore {
    /// Create a new document store client.
    #[must_use]
    pub fn new(config: &DocumentStoreConfig) -> Self {
        Self {
            inner: Arc::new(HttpDocumentStoreInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.trim_end_matches('/').to_string(),
                api_token: config.api_token.clone(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.inner.base_url)
    }

    /// Send a request with auth attached and fold non-2xx responses into
    /// [`BackendError::Store`].
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, BackendError> {
        let response = request
            .bearer_auth(self.inner.api_token.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(response);
        }

        Err(BackendError::Store(error_message(response).await))
    }
}

/// Map a transport failure to [`BackendError::Network`].
fn transport_error(err: reqwest::Error) -> BackendError {
    BackendError::Network(err.to_string())
}

/// Extract the store's error message, falling back to the status line.
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ApiErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => format!("request failed with status {status}"),
    }
}

#[async_trait::async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn set_document(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
        merge: bool,
    ) -> Result<(), BackendError> {
        let url = self.url(&format!("{collection}/{key}"));
        let request = self
            .inner
            .client
            .put(&url)
            .query(&[("merge", merge)])
            .json(&fields);

        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            // PUT creates, so a 404 here means the collection route is wrong.
            return Err(BackendError::Store(error_message(response).await));
        }
        Ok(())
    }

    async fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, BackendError> {
        let url = self.url(&format!("{collection}/{key}"));
        let response = self.send(self.inner.client.get(&url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document = response.json::<Document>().await.map_err(transport_error)?;
        Ok(Some(document))
    }

    async fn update_document(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
    ) -> Result<(), BackendError> {
        let url = self.url(&format!("{collection}/{key}"));
        let response = self.send(self.inner.client.patch(&url).json(&fields)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::Store(format!(
                "document not found: {collection}/{key}"
            )));
        }
        Ok(())
    }

    async fn delete_document(&self, collection: &str, key: &str) -> Result<(), BackendError> {
        let url = self.url(&format!("{collection}/{key}"));
        // A 404 means the document is already gone; deletion is idempotent.
        self.send(self.inner.client.delete(&url)).await?;
        Ok(())
    }

    async fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<Vec<Document>, BackendError> {
        let url = self.url(&format!("{collection}:query"));
        let body = QueryRequest {
            field,
            equals: value,
        };
        let response = self.send(self.inner.client.post(&url).json(&body)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::Store(error_message(response).await));
        }

        let list = response
            .json::<DocumentList>()
            .await
            .map_err(transport_error)?;
        Ok(list.documents)
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, BackendError> {
        let url = self.url(&format!("{collection}"));
        let response = self.send(self.inner.client.get(&url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::Store(error_message(response).await));
        }

        let list = response
            .json::<DocumentList>()
            .await
            .map_err(transport_error)?;
        Ok(list.documents)
    }
}
