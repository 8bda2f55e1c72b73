use crate::config::{DEFAULT_BCRYPT_COST, MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::ApiError;
use common::jwt::{check_token_shape, UserClaims};
use common::secret::SecretString;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::OnceLock;
use tracing::instrument;

/// Size of a freshly generated API key before hex encoding.
pub const API_KEY_BYTES: usize = 32;

/// bcrypt only reads this many bytes of its input and ignores the rest.
pub const BCRYPT_MAX_SECRET_BYTES: usize = 72;

const INVALID_TOKEN_MESSAGE: &str = "The access token is invalid or expired";

/// Hash a password or API key with bcrypt.
///
/// # Errors
///
/// Returns `ApiError::Crypto` if:
/// - Cost is outside the accepted range (config already validates it)
/// - Bcrypt hashing fails
///
/// Returns `ApiError::BadRequest` if the secret is longer than
/// [`BCRYPT_MAX_SECRET_BYTES`] (handlers already validate it).
#[instrument(skip_all)]
pub fn hash_secret(secret: &str, cost: u32) -> Result<String, ApiError> {
    if secret.len() > BCRYPT_MAX_SECRET_BYTES {
        return Err(ApiError::BadRequest(format!(
            "Secret must be at most {} bytes",
            BCRYPT_MAX_SECRET_BYTES
        )));
    }
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(ApiError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    bcrypt::hash(secret, cost).map_err(|e| ApiError::Crypto(format!("Hashing failed: {}", e)))
}

/// Verify a password or API key against a bcrypt hash.
///
/// The comparison inside bcrypt is constant-time. A secret longer than
/// [`BCRYPT_MAX_SECRET_BYTES`] never matches, since no such secret is ever
/// hashed and bcrypt would compare only its prefix.
#[instrument(skip_all)]
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, ApiError> {
    if secret.len() > BCRYPT_MAX_SECRET_BYTES {
        equalize_timing(secret);
        return Ok(false);
    }
    bcrypt::verify(secret, hash)
        .map_err(|e| ApiError::Crypto(format!("Hash verification failed: {}", e)))
}

/// Burn one bcrypt verification so that a lookup miss takes about as long
/// as a password mismatch.
pub fn equalize_timing(secret: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    let dummy = DUMMY_HASH.get_or_init(|| bcrypt::hash("timing-equalizer", DEFAULT_BCRYPT_COST).ok());
    if let Some(hash) = dummy {
        let _ = bcrypt::verify(secret, hash);
    }
}

/// Generate cryptographically secure random bytes
pub fn generate_random_bytes(len: usize) -> Result<Vec<u8>, ApiError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|e| ApiError::Crypto(format!("Random bytes generation failed: {}", e)))?;
    Ok(bytes)
}

/// Generate a new API key: 32 random bytes, hex encoded.
///
/// Returned as `SecretString` so it cannot end up in logs by accident.
#[instrument(skip_all)]
pub fn generate_api_key() -> Result<SecretString, ApiError> {
    let bytes = generate_random_bytes(API_KEY_BYTES)?;
    Ok(SecretString::from(hex::encode(bytes)))
}

/// Sign user claims into an HS256 JWT.
#[instrument(skip_all)]
pub fn sign_user_jwt(claims: &UserClaims, secret: &[u8]) -> Result<String, ApiError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    encode(&header, claims, &EncodingKey::from_secret(secret))
        .map_err(|e| ApiError::Crypto(format!("JWT signing operation failed: {}", e)))
}

/// Verify an HS256 user JWT and return its claims.
///
/// Validates:
/// - Token size and shape, before any decoding
/// - HMAC signature (HS256 only)
/// - Expiration (`exp`), with no leeway
///
/// `iat` and max-age policy are checked by the caller.
#[instrument(skip_all)]
pub fn verify_user_jwt(token: &str, secret: &[u8]) -> Result<UserClaims, ApiError> {
    check_token_shape(token).map_err(|e| {
        tracing::debug!(target: "api.crypto", error = ?e, "Token rejected before decoding");
        ApiError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string())
    })?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<UserClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| {
            tracing::debug!(target: "api.crypto", error = %e, "Token verification failed");
            ApiError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string())
        })?;

    Ok(token_data.claims)
}
