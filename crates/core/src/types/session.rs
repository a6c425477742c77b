//! Local representation of an authenticated identity.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// The currently authenticated principal.
///
/// A `Session` is created or replaced whenever the identity service emits a
/// session-change event (on initial subscribe, after login or signup) and
/// cleared on logout or when the service reports no active session. It is
/// owned by the session service; consumers only ever see read-only clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Backend-issued identity handle, also the profile document key.
    pub user_id: UserId,
    /// Email the account was registered with.
    pub email: Email,
}

impl Session {
    /// Create a session from its parts.
    #[must_use]
    pub const fn new(user_id: UserId, email: Email) -> Self {
        Self { user_id, email }
    }
}
