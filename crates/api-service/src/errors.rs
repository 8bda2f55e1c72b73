//! API error types.
//!
//! Domain errors are raised where they are detected and propagated unchanged
//! with `?`. The `IntoResponse` impl is the only place they are mapped to an
//! HTTP status plus a machine-readable code. Database and crypto details are
//! logged server-side and never returned to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("User not found")]
    UserNotFound,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User credentials are not valid")]
    UserCredentialsNotValid,

    #[error("User API token is not valid")]
    UserApiTokenNotValid,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Access denied")]
    AccessDenied,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Internal server error")]
    Internal,
}

/// Error kinds, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    CredentialsInvalid,
    TokenInvalid,
    AccessDenied,
    ConstraintViolation,
    Validation,
    Internal,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::UserNotFound | ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::UserCredentialsNotValid => ErrorKind::CredentialsInvalid,
            ApiError::UserApiTokenNotValid | ApiError::InvalidToken(_) => ErrorKind::TokenInvalid,
            ApiError::AccessDenied => ErrorKind::AccessDenied,
            ApiError::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            ApiError::BadRequest(_) => ErrorKind::Validation,
            ApiError::Database(_) | ApiError::Crypto(_) | ApiError::Internal => {
                ErrorKind::Internal
            }
        }
    }

    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::CredentialsInvalid | ErrorKind::TokenInvalid => 401,
            ErrorKind::AccessDenied => 403,
            ErrorKind::ConstraintViolation => 409,
            ErrorKind::Validation => 400,
            ErrorKind::Internal => 500,
        }
    }

    /// Map a sqlx error, surfacing unique and foreign-key violations as
    /// `ConstraintViolation` and everything else as `Database`.
    pub fn from_sqlx(context: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return ApiError::ConstraintViolation(constraint);
            }
        }
        ApiError::Database(format!("{}: {}", context, err))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            ApiError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", resource.clone())
            }
            ApiError::UserCredentialsNotValid => (
                StatusCode::UNAUTHORIZED,
                "USER_CREDENTIALS_NOT_VALID",
                "Invalid username or password".to_string(),
            ),
            ApiError::UserApiTokenNotValid => (
                StatusCode::UNAUTHORIZED,
                "USER_API_TOKEN_NOT_VALID",
                "Invalid API key".to_string(),
            ),
            ApiError::InvalidToken(reason) => {
                (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", reason.clone())
            }
            ApiError::AccessDenied => (
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "Access denied".to_string(),
            ),
            ApiError::ConstraintViolation(constraint) => {
                tracing::debug!(target: "api.errors", constraint = %constraint, "Constraint violation");
                (
                    StatusCode::CONFLICT,
                    "CONSTRAINT_VIOLATION",
                    "The request conflicts with an existing record".to_string(),
                )
            }
            ApiError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
            ApiError::Database(err) => {
                tracing::error!(target: "api.database", error = %err, "Database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            ApiError::Crypto(err) => {
                tracing::error!(target: "api.crypto", error = %err, "Cryptographic operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CRYPTO_ERROR",
                    "An internal cryptographic error occurred".to_string(),
                )
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
