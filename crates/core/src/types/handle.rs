//! User-chosen unique username (the directory "handle").

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Handle`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum HandleError {
    /// The input string is empty.
    #[error("username cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[A-Za-z0-9_.]`.
    #[error("username may only contain letters, digits, '_' and '.'")]
    InvalidCharacter,
}

/// A user-chosen unique username.
///
/// Uniqueness is enforced at signup time via an equality query against the
/// profile collection; this type only validates the shape. Comparison is
/// case-sensitive because the stored `userName` field is matched exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Maximum length of a handle.
    pub const MAX_LENGTH: usize = 30;

    /// Parse a `Handle` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 30 characters, or
    /// contains a character outside `[A-Za-z0-9_.]`.
    pub fn parse(s: &str) -> Result<Self, HandleError> {
        if s.is_empty() {
            return Err(HandleError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(HandleError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            return Err(HandleError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Handle` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Handle {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_handles() {
        assert!(Handle::parse("newbie").is_ok());
        assert!(Handle::parse("New_Bie.99").is_ok());
        assert!(Handle::parse("a").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Handle::parse(""), Err(HandleError::Empty)));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(31);
        assert!(matches!(
            Handle::parse(&long),
            Err(HandleError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_spaces_and_symbols() {
        assert!(matches!(
            Handle::parse("new bie"),
            Err(HandleError::InvalidCharacter)
        ));
        assert!(matches!(
            Handle::parse("new@bie"),
            Err(HandleError::InvalidCharacter)
        ));
    }

    #[test]
    fn test_serde_transparent() {
        let handle = Handle::parse("newbie").unwrap();
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, "\"newbie\"");
    }
}
