//! Error types for school-api
//!
//! Every error renders as `{"error": {"code": ..., "message": ...}}`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use school_common::ImportError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {message}")]
    BadRequest { code: &'static str, message: String },

    /// Identifier already taken (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or wrong API key (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Upload exceeds the body limit (413)
    #[error("Payload too large: {0}")]
    TooLarge(String),

    /// Record store failure (500)
    #[error("Store error: {0}")]
    Store(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code,
            message: message.into(),
        }
    }
}

impl From<school_common::Error> for ApiError {
    fn from(err: school_common::Error) -> Self {
        use school_common::Error;

        match err {
            Error::Database(e) => ApiError::Store(e.to_string()),
            Error::Io(e) => ApiError::Internal(e.to_string()),
            Error::Config(msg) => ApiError::Internal(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::bad_request("VALIDATION_FAILED", msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::StudentEnrolled(_) => ApiError::bad_request(
                "STUDENT_ENROLLED",
                "Cannot delete student: student is enrolled in a course",
            ),
            Error::Import(e) => e.into(),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        let code = match &err {
            ImportError::UnsupportedFile(_) => "UNSUPPORTED_FILE",
            ImportError::EmptyFile => "EMPTY_FILE",
            ImportError::NoRows => "NO_ROWS",
            ImportError::MissingColumns(_) => "MISSING_COLUMNS",
            ImportError::Malformed(_) => "MALFORMED_CSV",
            ImportError::InvalidRow { .. } => "INVALID_ROW",
        };
        ApiError::bad_request(code, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("INVALID_JSON", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request("INVALID_QUERY", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::TooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg),
            ApiError::Store(msg) => {
                error!("Record store error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", msg)
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
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
