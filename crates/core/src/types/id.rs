//! Identity handle issued by the external identity service.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for an authenticated principal.
///
/// The value is issued by the identity service and is also used as the key of
/// the user's profile document, so the two backends agree on identity without
/// any local mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a `UserId` from a backend-issued identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `UserId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let id = UserId::new("u-123");
        assert_eq!(format!("{id}"), "u-123");
    }

    #[test]
    fn test_serde_transparent() {
        let id = UserId::new("u-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"u-123\"");

        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
