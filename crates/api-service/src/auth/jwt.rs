//! Bearer token validation.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE hashing or parsing
//! - Only HS256 is accepted
//! - `exp` is enforced with no leeway, `iat` with clock skew tolerance, and
//!   `iat + max_age` as an absolute ceiling
//! - All failures surface as the same generic `InvalidToken` message

use crate::auth::token_cache::TokenCache;
use crate::config::Config;
use crate::crypto;
use crate::errors::ApiError;
use crate::observability::metrics::{record_token_cache_lookup, record_token_validation};
use crate::observability::ErrorCategory;
use common::jwt::{remaining_lifetime, validate_iat, UserClaims, MAX_JWT_SIZE_BYTES};
use common::secret::{ExposeSecret, SecretSlice};
use std::time::Duration;
use tracing::instrument;

const INVALID_TOKEN_MESSAGE: &str = "The access token is invalid or expired";

fn invalid_token() -> ApiError {
    ApiError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string())
}

pub struct JwtValidator {
    secret: SecretSlice<u8>,
    clock_skew: Duration,
    max_age: Duration,
    cache: TokenCache,
}

impl JwtValidator {
    pub fn new(
        secret: SecretSlice<u8>,
        clock_skew: Duration,
        max_age: Duration,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            secret,
            clock_skew,
            max_age,
            cache: TokenCache::new(cache_ttl),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.jwt_clock_skew(),
            config.jwt_max_age(),
            config.token_cache_ttl(),
        )
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Validate a bearer token and return its claims.
    ///
    /// A cached entry short-circuits verification; on a miss the token is
    /// fully verified and then cached for the shorter of the cache TTL and
    /// its remaining lifetime.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<UserClaims, ApiError> {
        if token.len() > MAX_JWT_SIZE_BYTES {
            tracing::debug!(target: "api.auth.jwt", size = token.len(), "Token too large");
            record_token_validation("error", Some(ErrorCategory::Authentication.as_str()));
            return Err(invalid_token());
        }

        if let Some(claims) = self.cache.get(token).await {
            record_token_cache_lookup("hit");
            record_token_validation("success", None);
            return Ok(claims);
        }
        record_token_cache_lookup("miss");

        match self.verify(token) {
            Ok((claims, lifetime)) => {
                self.cache.insert(token, claims.clone(), lifetime).await;
                record_token_validation("success", None);
                tracing::debug!(target: "api.auth.jwt", "Token validated successfully");
                Ok(claims)
            }
            Err(e) => {
                record_token_validation("error", Some(ErrorCategory::from(&e).as_str()));
                Err(e)
            }
        }
    }

    fn verify(&self, token: &str) -> Result<(UserClaims, Duration), ApiError> {
        let claims = crypto::verify_user_jwt(token, self.secret.expose_secret())?;

        if claims.user_id().is_none() {
            tracing::debug!(target: "api.auth.jwt", "Token subject is not a user id");
            return Err(invalid_token());
        }

        if let Err(e) = validate_iat(claims.iat, self.clock_skew) {
            tracing::debug!(target: "api.auth.jwt", error = ?e, "Token iat validation failed");
            return Err(invalid_token());
        }

        let now = chrono::Utc::now().timestamp();
        let lifetime = remaining_lifetime(&claims, self.max_age, now).map_err(|e| {
            tracing::debug!(target: "api.auth.jwt", error = ?e, "Token max age exceeded");
            invalid_token()
        })?;

        Ok((claims, lifetime))
    }
}
