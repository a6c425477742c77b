//! Session service.
//!
//! Owns the application's view of who is signed in. The service subscribes to
//! the identity client's session-change stream on construction and mirrors
//! every event into an [`AuthState`] held in a watch channel, so readers
//! always see the latest snapshot and can await changes. Sign-up and login
//! also apply their direct result, so the caller's next read agrees with the
//! session it was just handed even before the corresponding event arrives.
//!
//! The state starts as "initializing" and stays that way until the stream
//! delivers its first event; routes use this to avoid treating a
//! not-yet-restored session as signed out.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use expressly_core::{BackendError, Email, Session};

use crate::identity::{IdentityService, SessionChange};

/// Snapshot of the authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    /// The active session, if any.
    pub current_session: Option<Session>,
    /// True until the identity service has reported its initial state.
    pub is_initializing: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            current_session: None,
            is_initializing: true,
        }
    }
}

/// Keeps [`AuthState`] synchronized with the identity service.
pub struct SessionService {
    identity: Arc<dyn IdentityService>,
    state: Arc<watch::Sender<AuthState>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionService {
    /// Start the service: subscribe to the identity client's session-change
    /// stream and spawn the listener that mirrors it into [`AuthState`].
    ///
    /// The listener runs until [`shutdown`] or the client is dropped.
    ///
    /// [`shutdown`]: SessionService::shutdown
    #[must_use]
    pub fn start(identity: Arc<dyn IdentityService>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        let state = Arc::new(state);

        let mut events = identity.subscribe();
        let listener_state = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            while let Some(change) = events.next().await {
                // Events are full snapshots; the latest one always wins.
                listener_state.send_modify(|auth| {
                    auth.current_session = change;
                    auth.is_initializing = false;
                });
            }
            tracing::debug!("session event stream closed");
        });

        Self {
            identity,
            state,
            listener: Mutex::new(Some(handle)),
        }
    }

    /// Overwrite the current session. Initialization status is left to the
    /// event listener, which is the only writer allowed to clear it.
    fn apply(&self, change: SessionChange) {
        self.state.send_modify(|auth| auth.current_session = change);
    }

    /// Register a new account and sign it in.
    ///
    /// # Errors
    ///
    /// [`BackendError::Credential`] if the email is malformed or the identity
    /// service rejects the registration.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let email = Email::parse(email).map_err(|e| BackendError::Credential(e.to_string()))?;
        let session = self.identity.create_account(&email, password).await?;
        self.apply(Some(session.clone()));
        tracing::info!(user_id = %session.user_id, "account created");
        Ok(session)
    }

    /// Sign in with an email and password.
    ///
    /// # Errors
    ///
    /// [`BackendError::Credential`] if the email is malformed or the
    /// credentials are rejected; the state is left unchanged in either case.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let email = Email::parse(email).map_err(|e| BackendError::Credential(e.to_string()))?;
        let session = self.identity.verify_credentials(&email, password).await?;
        self.apply(Some(session.clone()));
        tracing::info!(user_id = %session.user_id, "logged in");
        Ok(session)
    }

    /// Sign out. Discarding the session is a local operation and always
    /// succeeds; signing out while signed out is a no-op.
    pub async fn log_out(&self) {
        self.identity.end_session().await;
        self.apply(None);
        tracing::info!("logged out");
    }

    /// Ask the identity service to email a password-reset link.
    ///
    /// # Errors
    ///
    /// [`BackendError::Credential`] if the email is malformed or unknown to
    /// the service.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), BackendError> {
        let email = Email::parse(email).map_err(|e| BackendError::Credential(e.to_string()))?;
        self.identity.send_reset_email(&email).await
    }

    /// Redeem an emailed reset code with a new password.
    ///
    /// # Errors
    ///
    /// [`BackendError::Credential`] if the code is invalid or expired.
    pub async fn confirm_password_reset(
        &self,
        code: &str,
        new_password: &str,
    ) -> Result<(), BackendError> {
        self.identity.apply_reset_code(code, new_password).await
    }

    /// The current authentication state.
    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// The active session, if any.
    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().current_session.clone()
    }

    /// Whether the initial session state is still being restored.
    #[must_use]
    pub fn is_initializing(&self) -> bool {
        self.state.borrow().is_initializing
    }

    /// A receiver that observes every [`AuthState`] change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Stop the event listener. Returns once the listener task has fully
    /// terminated; no state changes are applied after that. Safe to call more
    /// than once.
    pub async fn shutdown(&self) {
        let handle = self.listener.lock().await.take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
            tracing::debug!("session listener stopped");
        }
    }
}

impl Drop for SessionService {
    fn drop(&mut self) {
        // Best-effort cleanup when shutdown was never called.
        if let Ok(mut guard) = self.listener.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use tokio::sync::broadcast;
    use tokio::time::{sleep, timeout};

    use expressly_core::UserId;

    use crate::identity::SessionEvents;

    use super::*;

    struct FakeIdentity {
        events: broadcast::Sender<SessionChange>,
        snapshot: StdMutex<SessionChange>,
        accounts: StdMutex<HashMap<String, String>>,
        /// When set, the stream never delivers anything: no subscribe-time
        /// snapshot and no events. State then only moves through direct
        /// operation results.
        mute_events: bool,
    }

    impl FakeIdentity {
        fn new() -> Arc<Self> {
            Self::with_snapshot(None)
        }

        fn with_snapshot(snapshot: SessionChange) -> Arc<Self> {
            let (events, _) = broadcast::channel(16);
            Arc::new(Self {
                events,
                snapshot: StdMutex::new(snapshot),
                accounts: StdMutex::new(HashMap::new()),
                mute_events: false,
            })
        }

        fn muted() -> Arc<Self> {
            let (events, _) = broadcast::channel(16);
            Arc::new(Self {
                events,
                snapshot: StdMutex::new(None),
                accounts: StdMutex::new(HashMap::new()),
                mute_events: true,
            })
        }

        fn push(&self, change: SessionChange) {
            *self.snapshot.lock().unwrap() = change.clone();
            let _ = self.events.send(change);
        }

        fn register(&self, email: &str, password: &str) {
            self.accounts
                .lock()
                .unwrap()
                .insert(email.to_string(), password.to_string());
        }
    }

    fn session_for(email: &Email) -> Session {
        Session::new(UserId::new(format!("uid-{}", email.local_part())), email.clone())
    }

    #[async_trait::async_trait]
    impl IdentityService for FakeIdentity {
        fn subscribe(&self) -> SessionEvents {
            let rx = self.events.subscribe();
            if self.mute_events {
                return SessionEvents::new(None, rx);
            }
            let initial = self.snapshot.lock().unwrap().clone();
            SessionEvents::new(Some(initial), rx)
        }

        async fn create_account(
            &self,
            email: &Email,
            password: &str,
        ) -> Result<Session, BackendError> {
            {
                let mut accounts = self.accounts.lock().unwrap();
                if accounts.contains_key(email.as_str()) {
                    return Err(BackendError::Credential("EMAIL_EXISTS".to_string()));
                }
                accounts.insert(email.as_str().to_string(), password.to_string());
            }
            let session = session_for(email);
            if !self.mute_events {
                self.push(Some(session.clone()));
            }
            Ok(session)
        }

        async fn verify_credentials(
            &self,
            email: &Email,
            password: &str,
        ) -> Result<Session, BackendError> {
            {
                let accounts = self.accounts.lock().unwrap();
                match accounts.get(email.as_str()) {
                    None => return Err(BackendError::Credential("EMAIL_NOT_FOUND".to_string())),
                    Some(stored) if stored != password => {
                        return Err(BackendError::Credential("INVALID_PASSWORD".to_string()));
                    }
                    Some(_) => {}
                }
            }
            let session = session_for(email);
            if !self.mute_events {
                self.push(Some(session.clone()));
            }
            Ok(session)
        }

        async fn end_session(&self) {
            self.push(None);
        }

        async fn send_reset_email(&self, email: &Email) -> Result<(), BackendError> {
            if self.accounts.lock().unwrap().contains_key(email.as_str()) {
                Ok(())
            } else {
                Err(BackendError::Credential("EMAIL_NOT_FOUND".to_string()))
            }
        }

        async fn apply_reset_code(&self, code: &str, _new_password: &str) -> Result<(), BackendError> {
            if code == "valid-code" {
                Ok(())
            } else {
                Err(BackendError::Credential("INVALID_OOB_CODE".to_string()))
            }
        }
    }

    async fn wait_for<F>(rx: &mut watch::Receiver<AuthState>, pred: F) -> AuthState
    where
        F: Fn(&AuthState) -> bool,
    {
        timeout(Duration::from_secs(2), async {
            loop {
                {
                    let state = rx.borrow_and_update();
                    if pred(&state) {
                        return state.clone();
                    }
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap()
    }

    #[test]
    fn test_default_state_is_initializing() {
        let state = AuthState::default();
        assert!(state.is_initializing);
        assert!(state.current_session.is_none());
    }

    #[tokio::test]
    async fn test_state_stays_initializing_until_first_event() {
        let service = SessionService::start(FakeIdentity::muted());

        sleep(Duration::from_millis(20)).await;
        let state = service.auth_state();
        assert!(state.is_initializing);
        assert!(state.current_session.is_none());
    }

    #[tokio::test]
    async fn test_restored_session_arrives_via_initial_snapshot() {
        let email = Email::parse("restored@example.com").unwrap();
        let existing = session_for(&email);
        let fake = FakeIdentity::with_snapshot(Some(existing.clone()));

        let service = SessionService::start(fake);
        let mut rx = service.watch();
        let state = wait_for(&mut rx, |s| !s.is_initializing).await;

        assert_eq!(state.current_session, Some(existing));
    }

    #[tokio::test]
    async fn test_external_sign_out_event_is_observed() {
        let email = Email::parse("leaver@example.com").unwrap();
        let fake = FakeIdentity::with_snapshot(Some(session_for(&email)));

        let service = SessionService::start(Arc::clone(&fake) as Arc<dyn IdentityService>);
        let mut rx = service.watch();
        wait_for(&mut rx, |s| !s.is_initializing).await;

        // Session revoked outside this process.
        fake.push(None);
        let state = wait_for(&mut rx, |s| s.current_session.is_none()).await;
        assert!(!state.is_initializing);
    }

    #[tokio::test]
    async fn test_latest_event_wins() {
        let first = session_for(&Email::parse("first@example.com").unwrap());
        let second = session_for(&Email::parse("second@example.com").unwrap());
        let fake = FakeIdentity::new();

        let service = SessionService::start(Arc::clone(&fake) as Arc<dyn IdentityService>);
        let mut rx = service.watch();
        wait_for(&mut rx, |s| !s.is_initializing).await;

        fake.push(Some(first));
        fake.push(Some(second.clone()));
        let state = wait_for(&mut rx, |s| s.current_session == Some(second.clone())).await;
        assert!(!state.is_initializing);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_state_unchanged() {
        let fake = FakeIdentity::new();
        let service = SessionService::start(fake);
        let mut rx = service.watch();
        wait_for(&mut rx, |s| !s.is_initializing).await;

        let err = service.log_in("nobody@example.com", "pw").await.unwrap_err();
        assert_eq!(err, BackendError::Credential("EMAIL_NOT_FOUND".to_string()));
        assert!(service.current_session().is_none());
    }

    #[tokio::test]
    async fn test_login_rejects_malformed_email() {
        let service = SessionService::start(FakeIdentity::new());

        let err = service.log_in("not-an-email", "pw").await.unwrap_err();
        assert!(matches!(err, BackendError::Credential(_)));
        assert_eq!(err.message(), "email must contain an @ symbol");
    }

    #[tokio::test]
    async fn test_wrong_password_is_surfaced_verbatim() {
        let fake = FakeIdentity::new();
        fake.register("member@example.com", "right");

        let service = SessionService::start(Arc::clone(&fake) as Arc<dyn IdentityService>);
        let err = service.log_in("member@example.com", "wrong").await.unwrap_err();
        assert_eq!(err, BackendError::Credential("INVALID_PASSWORD".to_string()));
    }

    #[tokio::test]
    async fn test_log_out_is_idempotent() {
        let fake = FakeIdentity::new();
        fake.register("member@example.com", "pw");

        let service = SessionService::start(Arc::clone(&fake) as Arc<dyn IdentityService>);
        let mut rx = service.watch();
        wait_for(&mut rx, |s| !s.is_initializing).await;

        service.log_in("member@example.com", "pw").await.unwrap();
        assert!(service.current_session().is_some());

        service.log_out().await;
        let state = wait_for(&mut rx, |s| s.current_session.is_none()).await;
        assert!(!state.is_initializing);

        // Signing out while signed out changes nothing.
        service.log_out().await;
        wait_for(&mut rx, |s| s.current_session.is_none()).await;
    }

    #[tokio::test]
    async fn test_sign_up_result_applies_before_any_event() {
        let service = SessionService::start(FakeIdentity::muted());

        let session = service.sign_up("new@example.com", "pw").await.unwrap();
        assert_eq!(service.current_session(), Some(session));
    }

    #[tokio::test]
    async fn test_sign_up_event_completes_initialization() {
        let fake = FakeIdentity::new();
        let service = SessionService::start(fake);
        let mut rx = service.watch();

        let session = service.sign_up("new@example.com", "pw").await.unwrap();
        let state = wait_for(&mut rx, |s| {
            !s.is_initializing && s.current_session == Some(session.clone())
        })
        .await;
        assert_eq!(state.current_session, Some(session));
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_is_rejected() {
        let fake = FakeIdentity::new();
        fake.register("taken@example.com", "pw");

        let service = SessionService::start(Arc::clone(&fake) as Arc<dyn IdentityService>);
        let err = service.sign_up("taken@example.com", "pw2").await.unwrap_err();
        assert_eq!(err, BackendError::Credential("EMAIL_EXISTS".to_string()));
    }

    #[tokio::test]
    async fn test_shutdown_stops_applying_events() {
        let email = Email::parse("late@example.com").unwrap();
        let fake = FakeIdentity::new();

        let service = SessionService::start(Arc::clone(&fake) as Arc<dyn IdentityService>);
        let mut rx = service.watch();
        wait_for(&mut rx, |s| !s.is_initializing).await;

        service.shutdown().await;
        // Calling again is a no-op.
        service.shutdown().await;

        fake.push(Some(session_for(&email)));
        sleep(Duration::from_millis(50)).await;
        assert!(service.current_session().is_none());
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let fake = FakeIdentity::new();
        fake.register("member@example.com", "old");
        let service = SessionService::start(Arc::clone(&fake) as Arc<dyn IdentityService>);

        service
            .request_password_reset("member@example.com")
            .await
            .unwrap();
        let err = service
            .request_password_reset("stranger@example.com")
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::Credential("EMAIL_NOT_FOUND".to_string()));

        service
            .confirm_password_reset("valid-code", "new-password")
            .await
            .unwrap();
        let err = service
            .confirm_password_reset("stale", "new-password")
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::Credential("INVALID_OOB_CODE".to_string()));
    }
}
