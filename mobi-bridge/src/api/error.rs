//! API error handling.
//!
//! Errors are rendered as plain-text bodies; internal details stay in the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::Error;

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 404 with the canonical body.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }

    /// 500 with the canonical body.
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            _ if err.is_not_found() => ApiError::not_found(),
            Error::Io { ref source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Registered artifact is missing: {}", err);
                ApiError::not_found()
            }
            _ => {
                tracing::error!("Unexpected error: {}", err);
                ApiError::internal()
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_registry_miss_maps_to_404() {
        let err: ApiError = Error::not_found("zzz").into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Not Found");
    }

    #[test]
    fn test_missing_file_maps_to_404() {
        let err: ApiError = Error::io_path(
            "opening",
            Path::new("/uploads/gone.mobi"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        )
        .into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_other_errors_map_to_500() {
        let err: ApiError = Error::io_path(
            "opening",
            Path::new("/uploads/locked.mobi"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        )
        .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal Server Error");
    }
}
