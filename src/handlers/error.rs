//! API error types and response formatting.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::archive::ArchiveError;
use crate::index::IndexError;
use crate::service::IngestError;
use crate::validation::{FieldError, ValidationErrors};

/// API error type that converts to appropriate HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body could not be decoded as an impression request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Body decoded but failed field validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Object archive write failed.
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Metadata index write or scan failed.
    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation(e) => Self::Validation(e),
            IngestError::Archive(e) => Self::Archive(e),
            IngestError::Index(e) => Self::Index(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message, errors) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, Vec::new()),
            Self::Validation(errs) => (
                StatusCode::BAD_REQUEST,
                "validation_failed",
                errs.to_string(),
                errs.errors().to_vec(),
            ),
            Self::Archive(err) => {
                tracing::error!(error = %err, "archive error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "archive_error",
                    "Failed to archive impression".to_string(),
                    Vec::new(),
                )
            }
            Self::Index(err) => {
                tracing::error!(error = %err, "index error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "index_error",
                    "Failed to access impression index".to_string(),
                    Vec::new(),
                )
            }
        };

        let body = ErrorResponse {
            error,
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}
