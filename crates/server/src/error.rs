//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing request parameter. The message is user-facing.
    #[error("{0}")]
    BadRequest(String),

    /// Failure resolving an update or reading its objects.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Storage(#[from] ota_storage::StorageError),

    #[error(transparent)]
    Metadata(#[from] ota_metadata::MetadataError),

    #[error(transparent)]
    Core(#[from] ota_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Unavailable(_) => "unavailable",
            Self::Internal(_) => "internal_error",
            Self::Storage(_) => "storage_error",
            Self::Metadata(_) => "metadata_error",
            Self::Core(_) => "core_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Metadata(ota_metadata::MetadataError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Metadata(ota_metadata::MetadataError::AlreadyExists(_)) => StatusCode::CONFLICT,
            Self::Metadata(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Core(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Collapse a resolution or object failure into a 404.
    ///
    /// With `expose_details` off the client gets a generic message and the
    /// cause is only logged.
    pub fn into_not_found(self, expose_details: bool) -> Self {
        if let Self::BadRequest(_) = self {
            return self;
        }
        tracing::warn!(code = self.code(), error = %self, "request failed");
        if expose_details {
            Self::NotFound(self.to_string())
        } else {
            Self::NotFound("Update could not be resolved.".to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Storage(ota_storage::StorageError::NotFound("k".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Metadata(ota_metadata::MetadataError::AlreadyExists("k".into()))
                .status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_into_not_found_hides_details_when_asked() {
        let err = ApiError::Internal("db exploded".into());
        match err.into_not_found(false) {
            ApiError::NotFound(msg) => assert!(!msg.contains("db exploded")),
            other => panic!("unexpected {other:?}"),
        }

        let err = ApiError::Internal("db exploded".into());
        match err.into_not_found(true) {
            ApiError::NotFound(msg) => assert!(msg.contains("db exploded")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_into_not_found_keeps_validation_errors() {
        let err = ApiError::BadRequest("No runtimeVersion provided.".into());
        assert!(matches!(err.into_not_found(true), ApiError::BadRequest(_)));
    }
}
