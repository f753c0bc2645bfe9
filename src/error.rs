// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Shared by the engines, the storage backends and the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    // 400 Bad Request (wrong answer count, unknown label, bad payload)
    Validation(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden (e.g., a student reading another student's review)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict, a submission already exists for (student, assignment)
    AlreadySubmitted(String),

    // 409 Conflict (e.g., editing questions of an assignment with submissions)
    Conflict(String),

    // 422 Unprocessable Entity, an assignment that cannot be graded
    InvalidAssignment(String),

    // 503 Service Unavailable, repository or network failure
    TransientIo(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl AppError {
    /// Stable machine-readable kind, sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::AuthError(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::AlreadySubmitted(_) => "already_submitted",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidAssignment(_) => "invalid_assignment",
            AppError::TransientIo(_) => "transient_io",
            AppError::InternalServerError(_) => "internal_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::AlreadySubmitted(msg)
            | AppError::Conflict(msg)
            | AppError::InvalidAssignment(msg)
            | AppError::TransientIo(msg)
            | AppError::InternalServerError(msg) => msg,
        }
    }

    /// Only transient failures are worth retrying with the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::TransientIo(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::TransientIo(msg) => {
                tracing::error!("Repository unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::AlreadySubmitted(msg) => (StatusCode::CONFLICT, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidAssignment(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };
        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError`.
/// A unique violation can only come from the one-submission-per-student key.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::AlreadySubmitted(
                    "A submission already exists for this assignment".to_string(),
                )
            }
            _ => AppError::TransientIo(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
