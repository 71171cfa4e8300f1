//! API error types for the console
//!
//! Every failure surfaces as a JSON body the UI can render as a dismissible
//! banner; nothing here is fatal to the process. Validation failures map to
//! 400 and are produced before any network call.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{BackendError, IndexError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request, rejected before any network call (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., clearing an already-cleared flag
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A collaborator (backend or search index) failed (502)
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<screendesk_common::Error> for ApiError {
    fn from(err: screendesk_common::Error) -> Self {
        use screendesk_common::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Corrupt(msg) => ApiError::Internal(format!("Corrupt store value: {}", msg)),
            Error::Config(msg) => ApiError::Internal(msg),
            Error::Database(e) => ApiError::Internal(format!("Store error: {}", e)),
            Error::Io(e) => ApiError::Io(e),
            Error::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
