//! Directory profile document schema.
//!
//! Profiles are stored in the document store's `users` collection, keyed by
//! the owner's [`UserId`]. Field names are camelCase on the wire (`userName`,
//! `createdAt`, `updatedAt`) to stay compatible with documents written by
//! earlier versions of the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::handle::Handle;
use super::id::UserId;

/// The stored fields of a profile document, as serialized to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    /// Display name.
    pub name: String,
    /// Unique username.
    pub user_name: Handle,
    /// Registration email.
    pub email: Email,
    /// When the profile document was first written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the profile document was last updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfileFields {
    /// Attach the document key to produce a [`Profile`].
    #[must_use]
    pub fn into_profile(self, id: UserId) -> Profile {
        Profile {
            id,
            name: self.name,
            user_name: self.user_name,
            email: self.email,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A member's directory-visible profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Owner's identity handle (the document key).
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique username.
    pub user_name: Handle,
    /// Registration email.
    pub email: Email,
    /// When the profile document was first written.
    pub created_at: Option<DateTime<Utc>>,
    /// When the profile document was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for creating a profile document at signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    /// Display name.
    pub name: String,
    /// Unique username (availability already checked by the caller).
    pub user_name: Handle,
    /// Registration email.
    pub email: Email,
}

impl NewProfile {
    /// Produce the stored field set, stamping both timestamps with `now`.
    #[must_use]
    pub fn into_fields(self, now: DateTime<Utc>) -> ProfileFields {
        ProfileFields {
            name: self.name,
            user_name: self.user_name,
            email: self.email,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// A partial update to a profile document.
///
/// `None` fields are left untouched; `updatedAt` is always refreshed by the
/// profile service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New username, if changing (the caller re-checks availability).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<Handle>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.user_name.is_none()
    }
}
