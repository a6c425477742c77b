//! HTTP client for the identity service's REST API.
//!
//! Account operations are exposed as `POST /v1/accounts:{operation}` with the
//! project API key as a query parameter, in the identity-toolkit style:
//! `signUp`, `signInWithPassword`, `sendOobCode` (reset request) and
//! `resetPassword` (reset confirm). Rejections come back as
//! `{"error": {"message": "EMAIL_EXISTS"}}` and the message is surfaced
//! verbatim. Session termination is a local token discard; the service has no
//! sign-out endpoint.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::{broadcast, watch};

use expressly_core::{BackendError, Email, Session, UserId};

use crate::config::IdentityConfig;

use super::{EVENT_CHANNEL_CAPACITY, IdentityService, SessionChange, SessionEvents};

/// Error envelope returned by the identity service on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Successful response to `signUp` / `signInWithPassword`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
}

/// Client for the identity service's REST API.
#[derive(Clone)]
pub struct HttpIdentityClient {
    inner: Arc<HttpIdentityClientInner>,
}

struct HttpIdentityClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    /// Current session snapshot, delivered to new subscribers.
    snapshot: watch::Sender<SessionChange>,
    /// Live session-change events.
    events: broadcast::Sender<SessionChange>,
}

impl HttpIdentityClient {
    /// Create a new identity service client with no active session.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        let (snapshot, _) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(HttpIdentityClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
                snapshot,
                events,
            }),
        }
    }

    /// Record a new session state and notify subscribers.
    fn emit(&self, change: SessionChange) {
        self.inner.snapshot.send_replace(change.clone());
        // No receivers is fine; the snapshot still serves late subscribers.
        let _ = self.inner.events.send(change);
    }

    /// Execute an account operation against the identity service.
    async fn post<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: &serde_json::Value,
    ) -> Result<T, BackendError> {
        let url = format!("{}/v1/accounts:{operation}", self.inner.base_url);

        let response = self
            .inner
            .client
            .post(&url)
            .query(&[("key", self.inner.api_key.expose_secret())])
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => format!("request failed with status {status}"),
            };
            // 4xx is a rejection of the credentials themselves; everything
            // else is the service misbehaving.
            return Err(if status.is_client_error() {
                BackendError::Credential(message)
            } else {
                BackendError::Network(message)
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))
    }
}

#[async_trait::async_trait]
impl IdentityService for HttpIdentityClient {
    fn subscribe(&self) -> SessionEvents {
        // Attach the live receiver before reading the snapshot so an event
        // landing in between is seen twice rather than not at all. Events are
        // idempotent snapshots, so the duplicate is harmless.
        let rx = self.inner.events.subscribe();
        let initial = self.inner.snapshot.borrow().clone();
        SessionEvents::new(Some(initial), rx)
    }

    async fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Session, BackendError> {
        let response: SignInResponse = self
            .post(
                "signUp",
                &json!({
                    "email": email.as_str(),
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let session = Session::new(UserId::new(response.local_id), email.clone());
        self.emit(Some(session.clone()));
        Ok(session)
    }

    async fn verify_credentials(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Session, BackendError> {
        let response: SignInResponse = self
            .post(
                "signInWithPassword",
                &json!({
                    "email": email.as_str(),
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let session = Session::new(UserId::new(response.local_id), email.clone());
        self.emit(Some(session.clone()));
        Ok(session)
    }

    async fn end_session(&self) {
        self.emit(None);
    }

    async fn send_reset_email(&self, email: &Email) -> Result<(), BackendError> {
        let _: serde_json::Value = self
            .post(
                "sendOobCode",
                &json!({
                    "requestType": "PASSWORD_RESET",
                    "email": email.as_str(),
                }),
            )
            .await?;
        Ok(())
    }

    async fn apply_reset_code(&self, code: &str, new_password: &str) -> Result<(), BackendError> {
        let _: serde_json::Value = self
            .post(
                "resetPassword",
                &json!({
                    "oobCode": code,
                    "newPassword": new_password,
                }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn test_client() -> HttpIdentityClient {
        HttpIdentityClient::new(&IdentityConfig {
            base_url: "http://localhost:9099".to_string(),
            api_key: SecretString::from("test-key"),
        })
    }

    #[tokio::test]
    async fn test_subscribe_delivers_signed_out_snapshot() {
        let client = test_client();
        let mut events = client.subscribe();

        // A fresh client has no session; the subscribe-time snapshot says so.
        assert_eq!(events.next().await, Some(None));
    }

    #[tokio::test]
    async fn test_end_session_notifies_subscribers() {
        let client = test_client();
        let mut events = client.subscribe();
        assert_eq!(events.next().await, Some(None));

        client.end_session().await;
        assert_eq!(events.next().await, Some(None));
    }
}
