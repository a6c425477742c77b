//! Backend error taxonomy.
//!
//! Every failure surfaced by the external identity service or document store
//! is folded into one of three kinds, each carrying the originating service's
//! message verbatim. Callers branch on the kind instead of string-matching.

use thiserror::Error;

/// Errors surfaced by the external backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The identity service rejected the credentials: bad email/password,
    /// duplicate account, or an invalid/expired password-reset code.
    #[error("credential rejected: {0}")]
    Credential(String),

    /// A document create/read/update/delete/query failed against the store.
    #[error("document store error: {0}")]
    Store(String),

    /// Transient connectivity failure from either external client.
    #[error("network error: {0}")]
    Network(String),
}

impl BackendError {
    /// The originating service's message, without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Credential(msg) | Self::Store(msg) | Self::Network(msg) => msg,
        }
    }

    /// Whether this is a credential rejection (a user-facing failure rather
    /// than an operational one).
    #[must_use]
    pub const fn is_credential(&self) -> bool {
        matches!(self, Self::Credential(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_verbatim_message() {
        let err = BackendError::Credential("EMAIL_EXISTS".to_string());
        assert_eq!(err.to_string(), "credential rejected: EMAIL_EXISTS");
        assert_eq!(err.message(), "EMAIL_EXISTS");
    }

    #[test]
    fn test_kind_predicates() {
        assert!(BackendError::Credential(String::new()).is_credential());
        assert!(!BackendError::Store(String::new()).is_credential());
        assert!(!BackendError::Network(String::new()).is_credential());
    }
}
