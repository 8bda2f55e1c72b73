//! Observability for the API service.
//!
//! # Privacy by Default
//!
//! Instrumented functions use `#[instrument(skip_all)]` and record fields
//! explicitly. Fields fall in three groups:
//! - **SAFE**: ids, enums, operation outcomes
//! - **HASHED**: usernames, via [`hash_for_correlation`]
//! - **NEVER**: passwords, API keys, bearer tokens, hashes of any of these

pub mod metrics;

use crate::errors::{ApiError, ErrorKind};
use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// One-way and truncated: good for matching log lines, not for secrets.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    digest.get(..4).map(hex::encode).unwrap_or_default()
}

/// Bounded error categories for metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad credentials, bad or expired tokens
    Authentication,
    /// Authenticated but not permitted
    Authorization,
    /// Request shape or constraint problems
    Client,
    /// Database, crypto and everything unexpected
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Authorization => "authorization",
            ErrorCategory::Client => "client",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl From<&ApiError> for ErrorCategory {
    fn from(err: &ApiError) -> Self {
        match err.kind() {
            ErrorKind::CredentialsInvalid | ErrorKind::TokenInvalid => {
                ErrorCategory::Authentication
            }
            ErrorKind::AccessDenied => ErrorCategory::Authorization,
            ErrorKind::NotFound | ErrorKind::ConstraintViolation | ErrorKind::Validation => {
                ErrorCategory::Client
            }
            ErrorKind::Internal => ErrorCategory::Internal,
        }
    }
}
