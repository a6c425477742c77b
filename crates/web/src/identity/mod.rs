//! Identity service client.
//!
//! The external identity service owns accounts, credentials, session tokens,
//! and password reset. This module defines the client interface the rest of
//! the application consumes: five imperative operations plus a session-change
//! stream that fires whenever the remote session state changes, including
//! changes the local process did not initiate.

mod http;

pub use http::HttpIdentityClient;

use async_trait::async_trait;
use tokio::sync::broadcast;

use expressly_core::{BackendError, Email, Session};

/// Payload of one session-change event: the new session, or `None` when the
/// service reports no active session.
pub type SessionChange = Option<Session>;

/// Capacity of the session-change broadcast channel. Events are idempotent
/// snapshots, so a lagged receiver only needs the newest one.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Receiver half of the session-change stream.
///
/// The first call to [`next`] may yield the client's current snapshot (the
/// stream fires once on subscribe, like the SDK it mirrors); subsequent calls
/// yield live events. Dropped events from a lagged receiver are skipped, as
/// each event fully replaces the previous one.
///
/// [`next`]: SessionEvents::next
pub struct SessionEvents {
    initial: Option<SessionChange>,
    rx: broadcast::Receiver<SessionChange>,
}

impl SessionEvents {
    /// Assemble a stream from an optional subscribe-time snapshot and a live
    /// event receiver.
    #[must_use]
    pub const fn new(initial: Option<SessionChange>, rx: broadcast::Receiver<SessionChange>) -> Self {
        Self { initial, rx }
    }

    /// The next session-change event, or `None` once the sender is gone.
    pub async fn next(&mut self) -> Option<SessionChange> {
        if let Some(first) = self.initial.take() {
            return Some(first);
        }

        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                // Skipped events are superseded by the ones still queued.
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Client interface to the external identity service.
///
/// Credential rejections surface as [`BackendError::Credential`] carrying the
/// service's message verbatim; transport failures as
/// [`BackendError::Network`].
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Subscribe to the session-change stream.
    fn subscribe(&self) -> SessionEvents;

    /// Create an account and open a session for it.
    async fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Session, BackendError>;

    /// Verify credentials and open a session.
    async fn verify_credentials(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Session, BackendError>;

    /// Terminate the current session. Session termination is a local token
    /// discard, so it cannot fail; subscribers observe a signed-out event.
    async fn end_session(&self);

    /// Ask the service to email `email` a password-reset link.
    async fn send_reset_email(&self, email: &Email) -> Result<(), BackendError>;

    /// Redeem an out-of-band reset code with a new password.
    async fn apply_reset_code(&self, code: &str, new_password: &str) -> Result<(), BackendError>;
}
