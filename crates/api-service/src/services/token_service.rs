use crate::crypto;
use crate::errors::ApiError;
use crate::models::{SafeUser, TokenResponse};
use chrono::Utc;
use common::jwt::{UserClaims, BEARER_TOKEN_TYPE};
use tracing::instrument;
use uuid::Uuid;

/// Issue an access token for an authenticated user.
///
/// Claims: `sub` (user id), `username`, `iat`, `exp = iat + expires_in`, and
/// a random `jti`.
#[instrument(skip_all, fields(user_id = user.id))]
pub fn issue_user_token(
    user: &SafeUser,
    secret: &[u8],
    expires_in_seconds: u64,
) -> Result<TokenResponse, ApiError> {
    let lifetime = i64::try_from(expires_in_seconds)
        .map_err(|_| ApiError::Crypto("Token lifetime out of range".to_string()))?;

    let now = Utc::now().timestamp();
    let claims = UserClaims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        iat: now,
        exp: now.saturating_add(lifetime),
        jti: Uuid::new_v4().to_string(),
    };

    let access_token = crypto::sign_user_jwt(&claims, secret)?;

    tracing::debug!(target: "api.service.token", "Access token issued");

    Ok(TokenResponse {
        access_token,
        token_type: BEARER_TOKEN_TYPE.to_string(),
        expires_in: expires_in_seconds,
    })
}
