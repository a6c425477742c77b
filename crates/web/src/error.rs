//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use expressly_core::BackendError;

use crate::services::DirectoryError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// A backend service rejected or never completed the operation.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Member directory operation failed.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Whether this error is worth reporting to Sentry: server-side and
    /// backend failures, not user mistakes.
    fn is_reportable(&self) -> bool {
        match self {
            Self::Backend(BackendError::Store(_) | BackendError::Network(_)) => true,
            Self::Directory(err) => !matches!(
                err,
                DirectoryError::Backend(BackendError::Credential(_))
            ),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_reportable() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Backend(err) | Self::Directory(DirectoryError::Backend(err)) => match err {
                BackendError::Credential(_) => StatusCode::UNAUTHORIZED,
                BackendError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                BackendError::Network(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Directory(DirectoryError::Partial { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        // Credential rejections carry the backend's message verbatim; other
        // backend details stay server-side.
        let message = match &self {
            Self::Backend(err) | Self::Directory(DirectoryError::Backend(err)) => match err {
                BackendError::Credential(msg) => msg.clone(),
                BackendError::Store(_) => "Internal server error".to_string(),
                BackendError::Network(_) => "External service error".to_string(),
            },
            Self::Directory(DirectoryError::Partial { deleted, failed }) => {
                format!("Removed {deleted} members, {} could not be removed", failed.len())
            }
            Self::NotFound(_) => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("u-123".to_string());
        assert_eq!(err.to_string(), "Not found: u-123");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Backend(BackendError::Credential(
                "INVALID_PASSWORD".to_string()
            ))),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::Store("boom".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::Network("down".to_string()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_partial_failure_maps_to_server_error() {
        let err = AppError::Directory(DirectoryError::Partial {
            deleted: 3,
            failed: vec![(
                expressly_core::UserId::new("u-1"),
                BackendError::Store("refused".to_string()),
            )],
        });
        assert_eq!(get_status(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
