//! Profile service.
//!
//! Profiles live in the document store's `users` collection, keyed by the
//! owner's [`UserId`]. Writes always go through merge semantics so fields
//! written by other tooling survive, and every write refreshes `updatedAt`.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use expressly_core::{BackendError, Handle, NewProfile, Profile, ProfileFields, ProfileUpdate, UserId};

use crate::store::{DocumentStore, Fields};

/// Collection holding one profile document per member.
pub(crate) const PROFILE_COLLECTION: &str = "users";

/// Serialize a document payload into a field map.
fn to_fields<T: Serialize>(value: &T) -> Result<Fields, BackendError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(BackendError::Store(
            "profile did not serialize to an object".to_string(),
        )),
        Err(e) => Err(BackendError::Store(e.to_string())),
    }
}

/// Reads and writes member profile documents.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    /// Create a profile service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Write the initial profile document for a freshly registered member,
    /// stamping `createdAt` and `updatedAt`.
    ///
    /// # Errors
    ///
    /// Fails with [`BackendError::Store`] or [`BackendError::Network`] when
    /// the write does not go through; the account itself already exists at
    /// that point, so callers surface this rather than rolling back.
    pub async fn create_profile(
        &self,
        user_id: &UserId,
        profile: NewProfile,
    ) -> Result<(), BackendError> {
        let fields = to_fields(&profile.into_fields(Utc::now()))?;
        self.store
            .set_document(PROFILE_COLLECTION, user_id.as_str(), fields, true)
            .await
            .inspect_err(|e| {
                tracing::error!(user_id = %user_id, error = %e, "profile creation failed");
            })
    }

    /// Fetch a member's profile, or `None` if no document exists.
    ///
    /// # Errors
    ///
    /// A document that exists but does not deserialize as a profile is
    /// reported as [`BackendError::Store`].
    pub async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, BackendError> {
        let Some(document) = self
            .store
            .get_document(PROFILE_COLLECTION, user_id.as_str())
            .await?
        else {
            return Ok(None);
        };

        let fields: ProfileFields =
            serde_json::from_value(serde_json::Value::Object(document.fields))
                .map_err(|e| BackendError::Store(format!("malformed profile document: {e}")))?;
        Ok(Some(fields.into_profile(user_id.clone())))
    }

    /// Apply a partial update to an existing profile, refreshing `updatedAt`.
    /// An empty update writes nothing.
    ///
    /// # Errors
    ///
    /// Fails with [`BackendError::Store`] if the profile document does not
    /// exist.
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<(), BackendError> {
        if update.is_empty() {
            return Ok(());
        }

        let mut fields = to_fields(&update)?;
        fields.insert("updatedAt".to_string(), json!(Utc::now()));
        self.store
            .update_document(PROFILE_COLLECTION, user_id.as_str(), fields)
            .await
    }

    /// Whether no member currently holds `handle` as their username.
    ///
    /// # Errors
    ///
    /// Propagates store and network failures; availability is unknown then,
    /// so callers must not treat the error as "taken" or "free".
    pub async fn is_handle_available(&self, handle: &Handle) -> Result<bool, BackendError> {
        let hits = self
            .store
            .query_equals(PROFILE_COLLECTION, "userName", &json!(handle.as_str()))
            .await?;
        Ok(hits.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use expressly_core::Email;

    use crate::store::MemoryDocumentStore;

    use super::*;

    fn service() -> (ProfileService, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        (ProfileService::new(Arc::new(store.clone())), store)
    }

    fn new_profile(handle: &str) -> NewProfile {
        NewProfile {
            name: "New Member".to_string(),
            user_name: Handle::parse(handle).unwrap(),
            email: Email::parse("new@example.com").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_profile() {
        let (profiles, _) = service();
        let id = UserId::new("u-1");

        profiles.create_profile(&id, new_profile("newbie")).await.unwrap();

        let profile = profiles.get_profile(&id).await.unwrap().unwrap();
        assert_eq!(profile.id, id);
        assert_eq!(profile.user_name.as_str(), "newbie");
        assert!(profile.created_at.is_some());
        assert_eq!(profile.created_at, profile.updated_at);
    }

    #[tokio::test]
    async fn test_get_missing_profile_is_none() {
        let (profiles, _) = service();
        assert!(profiles.get_profile(&UserId::new("ghost")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_document_is_a_store_error() {
        let (profiles, store) = service();
        store
            .set_document(
                PROFILE_COLLECTION,
                "u-1",
                json!({"name": 42}).as_object().unwrap().clone(),
                false,
            )
            .await
            .unwrap();

        let err = profiles.get_profile(&UserId::new("u-1")).await.unwrap_err();
        assert!(matches!(err, BackendError::Store(_)));
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at_only() {
        let (profiles, _) = service();
        let id = UserId::new("u-1");
        profiles.create_profile(&id, new_profile("newbie")).await.unwrap();
        let before = profiles.get_profile(&id).await.unwrap().unwrap();

        profiles
            .update_profile(
                &id,
                ProfileUpdate {
                    name: Some("Renamed".to_string()),
                    user_name: None,
                },
            )
            .await
            .unwrap();

        let after = profiles.get_profile(&id).await.unwrap().unwrap();
        assert_eq!(after.name, "Renamed");
        assert_eq!(after.user_name.as_str(), "newbie");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_profile_fails() {
        let (profiles, _) = service();
        let err = profiles
            .update_profile(
                &UserId::new("ghost"),
                ProfileUpdate {
                    name: Some("X".to_string()),
                    user_name: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Store(_)));
    }

    #[tokio::test]
    async fn test_empty_update_writes_nothing() {
        let (profiles, _) = service();
        // Would fail if it reached the store, since the document is missing.
        profiles
            .update_profile(&UserId::new("ghost"), ProfileUpdate::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_handle_availability() {
        let (profiles, _) = service();
        let handle = Handle::parse("newbie").unwrap();
        assert!(profiles.is_handle_available(&handle).await.unwrap());

        profiles
            .create_profile(&UserId::new("u-1"), new_profile("newbie"))
            .await
            .unwrap();
        assert!(!profiles.is_handle_available(&handle).await.unwrap());
        assert!(profiles
            .is_handle_available(&Handle::parse("other").unwrap())
            .await
            .unwrap());
    }
}
