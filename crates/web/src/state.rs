//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ExpresslyConfig;
use crate::identity::{HttpIdentityClient, IdentityService};
use crate::services::{MemberDirectory, ProfileService, SessionService};
use crate::store::{DocumentStore, HttpDocumentStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like backend clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ExpresslyConfig,
    sessions: SessionService,
    profiles: ProfileService,
    directory: MemberDirectory,
}

impl AppState {
    /// Create application state with HTTP clients for the configured
    /// identity service and document store.
    #[must_use]
    pub fn new(config: ExpresslyConfig) -> Self {
        let identity = Arc::new(HttpIdentityClient::new(&config.identity));
        let store = Arc::new(HttpDocumentStore::new(&config.store));
        Self::with_services(config, identity, store)
    }

    /// Create application state over explicit backend implementations.
    /// Tests use this to swap in in-process fakes.
    #[must_use]
    pub fn with_services(
        config: ExpresslyConfig,
        identity: Arc<dyn IdentityService>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let sessions = SessionService::start(identity);
        let profiles = ProfileService::new(Arc::clone(&store));
        let directory = MemberDirectory::new(store);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                sessions,
                profiles,
                directory,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &ExpresslyConfig {
        &self.inner.config
    }

    /// Get a reference to the session service.
    #[must_use]
    pub fn sessions(&self) -> &SessionService {
        &self.inner.sessions
    }

    /// Get a reference to the profile service.
    #[must_use]
    pub fn profiles(&self) -> &ProfileService {
        &self.inner.profiles
    }

    /// Get a reference to the member directory.
    #[must_use]
    pub fn directory(&self) -> &MemberDirectory {
        &self.inner.directory
    }

    /// Stop background work. Called once after the server loop exits.
    pub async fn shutdown(&self) {
        self.inner.sessions.shutdown().await;
    }
}
