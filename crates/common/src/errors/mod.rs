//! Error types for StudyShelf services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned to clients for any 5xx error. The cause is only logged.
pub const GENERIC_SERVER_MESSAGE: &str = "Failed to load catalog";

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,

    // Resource errors (4xxx)
    BookNotFound,

    // Rate limiting (6xxx)
    RateLimited,

    // Source errors (7xxx)
    DatasetUnavailable,
    DatasetInvalid,

    // Internal errors (9xxx)
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,

            // Resources (4xxx)
            ErrorCode::BookNotFound => 4002,

            // Rate limits (6xxx)
            ErrorCode::RateLimited => 6001,

            // Sources (7xxx)
            ErrorCode::DatasetUnavailable => 7001,
            ErrorCode::DatasetInvalid => 7002,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // Resource errors
    #[error("Book not found: {id}")]
    BookNotFound { id: String },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Source errors
    #[error("Book dataset unavailable at {path}: {source}")]
    DatasetUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Book dataset at {path} is not valid JSON: {source}")]
    DatasetInvalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::BookNotFound { .. } => ErrorCode::BookNotFound,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::DatasetUnavailable { .. } => ErrorCode::DatasetUnavailable,
            AppError::DatasetInvalid { .. } => ErrorCode::DatasetInvalid,
            AppError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::BookNotFound { .. } => StatusCode::NOT_FOUND,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::DatasetUnavailable { .. } |
            AppError::DatasetInvalid { .. } |
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Message safe to show to API clients
    pub fn public_message(&self) -> String {
        if self.is_server_error() {
            GENERIC_SERVER_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let details = match &self {
            AppError::Validation { field: Some(field), .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message: self.public_message(),
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::BookNotFound { id: "abc".into() };
        assert_eq!(err.code(), ErrorCode::BookNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code().as_code(), 4002);
    }

    #[test]
    fn test_every_variant_has_code_and_status() {
        let io = || std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let json = || serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let cases = [
            (AppError::Validation { message: "bad".into(), field: None }, 1001, StatusCode::BAD_REQUEST),
            (AppError::BookNotFound { id: "x".into() }, 4002, StatusCode::NOT_FOUND),
            (AppError::RateLimited { limit: 1 }, 6001, StatusCode::TOO_MANY_REQUESTS),
            (AppError::DatasetUnavailable { path: "a".into(), source: io() }, 7001, StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::DatasetInvalid { path: "a".into(), source: json() }, 7002, StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Internal { message: "join".into() }, 9001, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, code, status) in cases {
            assert_eq!(err.code().as_code(), code);
            assert_eq!(err.status_code(), status);
        }
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "unknown source 'web'".into(),
            field: Some("source".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
        assert!(err.public_message().contains("unknown source"));
    }

    #[test]
    fn test_dataset_error_is_not_leaked() {
        let err = AppError::DatasetUnavailable {
            path: "/srv/app/data/books.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_server_error());
        assert_eq!(err.public_message(), GENERIC_SERVER_MESSAGE);
        assert!(err.to_string().contains("books.json"));
    }
}
