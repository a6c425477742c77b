//! Member directory.
//!
//! Backs the admin panel: paginated listing of every member profile plus
//! single and bulk removal. The store has no server-side pagination, so the
//! full collection is fetched and sliced locally.

use std::sync::Arc;

use expressly_core::{BackendError, Profile, ProfileFields, UserId};

use crate::store::{Document, DocumentStore};

use super::profiles::PROFILE_COLLECTION;

/// Members shown per directory page.
pub const PAGE_SIZE: usize = 20;

/// Errors from directory operations.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The backend rejected or never completed the operation.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// Bulk removal deleted some members but not all. Deletions that
    /// succeeded are final; `failed` lists the members still present.
    #[error("removed {deleted} members, {} failed", .failed.len())]
    Partial {
        /// Number of members successfully removed.
        deleted: usize,
        /// The members that could not be removed, with the reason each.
        failed: Vec<(UserId, BackendError)>,
    },
}

/// One page of the member directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPage {
    /// Profiles on this page, in stable store order.
    pub members: Vec<Profile>,
    /// The page actually served, after clamping.
    pub page: usize,
    /// Total number of pages (at least 1).
    pub total_pages: usize,
    /// Total members across all pages.
    pub total_members: usize,
}

/// Administrative view over all member profiles.
#[derive(Clone)]
pub struct MemberDirectory {
    store: Arc<dyn DocumentStore>,
}

impl MemberDirectory {
    /// Create a directory over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Serve one page of the directory. Pages are 1-based; out-of-range
    /// requests are clamped to the nearest valid page. Documents that do not
    /// parse as profiles are skipped rather than failing the whole listing.
    ///
    /// # Errors
    ///
    /// Propagates store and network failures from the listing itself.
    pub async fn list(&self, page: usize) -> Result<MemberPage, DirectoryError> {
        let documents = self.store.list_documents(PROFILE_COLLECTION).await?;
        let members: Vec<Profile> = documents.into_iter().filter_map(parse_profile).collect();

        let total_members = members.len();
        let total_pages = total_members.div_ceil(PAGE_SIZE).max(1);
        let page = page.clamp(1, total_pages);

        let members = members
            .into_iter()
            .skip((page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect();

        Ok(MemberPage {
            members,
            page,
            total_pages,
            total_members,
        })
    }

    /// Remove one member's profile. Removing an already-absent profile
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Propagates store and network failures.
    pub async fn remove(&self, user_id: &UserId) -> Result<(), DirectoryError> {
        self.store
            .delete_document(PROFILE_COLLECTION, user_id.as_str())
            .await?;
        tracing::info!(user_id = %user_id, "member removed");
        Ok(())
    }

    /// Remove every member profile. Each deletion stands on its own: profiles
    /// deleted before a failure stay deleted, and the error reports exactly
    /// which members remain.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::Partial`] when some deletions failed;
    /// [`DirectoryError::Backend`] when the listing itself failed.
    pub async fn remove_all(&self) -> Result<usize, DirectoryError> {
        let documents = self.store.list_documents(PROFILE_COLLECTION).await?;

        let deletions = documents.into_iter().map(|doc| {
            let store = Arc::clone(&self.store);
            async move {
                let id = UserId::new(doc.id);
                match store.delete_document(PROFILE_COLLECTION, id.as_str()).await {
                    Ok(()) => Ok(()),
                    Err(e) => Err((id, e)),
                }
            }
        });

        let results = futures::future::join_all(deletions).await;
        let total = results.len();
        let failed: Vec<(UserId, BackendError)> =
            results.into_iter().filter_map(Result::err).collect();

        if failed.is_empty() {
            tracing::info!(count = total, "all members removed");
            Ok(total)
        } else {
            let deleted = total - failed.len();
            tracing::warn!(deleted, failed = failed.len(), "bulk removal incomplete");
            Err(DirectoryError::Partial { deleted, failed })
        }
    }
}

/// Parse a store document as a profile, skipping it with a warning if the
/// fields do not match the schema.
fn parse_profile(document: Document) -> Option<Profile> {
    let id = UserId::new(document.id);
    match serde_json::from_value::<ProfileFields>(serde_json::Value::Object(document.fields)) {
        Ok(fields) => Some(fields.into_profile(id)),
        Err(e) => {
            tracing::warn!(user_id = %id, error = %e, "skipping malformed profile document");
            None
        }
    }
}
