//! JWT rules shared by the API service and its test tooling.
//!
//! This module owns the parts of bearer-token handling that do not depend on
//! the signing key:
//! - Size limit checked before any parsing
//! - Clock skew constants and `iat` validation
//! - The absolute max-age policy and the remaining-lifetime computation
//!   used to bound token cache entries
//! - The user token claims structure
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Generic error messages prevent information leakage
//! - `sub`, `username` and `jti` are redacted in Debug output

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical user tokens are 200-300 bytes. Anything larger than this is
/// rejected before base64 decoding or HMAC verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default clock skew tolerance for `iat` validation (5 minutes).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Upper bound for configurable clock skew (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// The only token type the API issues.
pub const BEARER_TOKEN_TYPE: &str = "Bearer";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during JWT policy checks.
///
/// All variants render the same message so callers cannot distinguish
/// failure reasons from the outside. Details are logged at debug level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token is not `header.payload.signature`.
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token `iat` claim is too far in the future.
    #[error("The access token is invalid or expired")]
    IatTooFarInFuture,

    /// Token was issued longer ago than the max-age policy allows.
    #[error("The access token is invalid or expired")]
    TokenTooOld,
}

// =============================================================================
// Claims Types
// =============================================================================

/// Claims carried by a user access token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// Subject: the numeric user id, as a string.
    pub sub: String,

    /// Username at the time of issuance.
    pub username: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Unique token identifier.
    pub jti: String,
}

impl fmt::Debug for UserClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserClaims")
            .field("sub", &"[REDACTED]")
            .field("username", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("jti", &"[REDACTED]")
            .finish()
    }
}

impl UserClaims {
    /// Parse `sub` back into the numeric user id.
    ///
    /// Returns `None` for a subject that is not a positive 32-bit integer.
    #[must_use]
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse::<i32>().ok().filter(|id| *id > 0)
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Reject tokens that are oversized or not shaped like a compact JWS.
///
/// # Errors
///
/// - `TokenTooLarge` if the token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` if it does not have exactly three non-empty segments
pub fn check_token_shape(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let segments = token.split('.').collect::<Vec<_>>();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        tracing::debug!(
            target: "common.jwt",
            segments = segments.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    Ok(())
}

/// Validate the `iat` claim against the current time with clock skew tolerance.
///
/// # Errors
///
/// Returns `IatTooFarInFuture` if `iat` is more than `clock_skew` ahead of now.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    // Safe cast: clock_skew is bounded to MAX_CLOCK_SKEW (600 seconds)
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now + clock_skew_secs;

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

/// How much longer a verified token may be trusted.
///
/// The token is trusted until the earlier of its own `exp` and the absolute
/// max-age deadline `iat + max_age`. Used to bound token cache entries so
/// that a cached token never outlives its validity window.
///
/// # Errors
///
/// Returns `TokenTooOld` when the earlier deadline is not after `now`.
pub fn remaining_lifetime(
    claims: &UserClaims,
    max_age: Duration,
    now: i64,
) -> Result<Duration, JwtValidationError> {
    let max_age_secs = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
    let deadline = claims.exp.min(claims.iat.saturating_add(max_age_secs));

    if deadline <= now {
        tracing::debug!(
            target: "common.jwt",
            iat = claims.iat,
            exp = claims.exp,
            now = now,
            "Token rejected: beyond max age"
        );
        return Err(JwtValidationError::TokenTooOld);
    }

    // Safe cast: deadline > now so the difference is positive
    #[allow(clippy::cast_sign_loss)]
    let remaining = (deadline - now) as u64;
    Ok(Duration::from_secs(remaining))
}
