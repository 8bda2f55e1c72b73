//! Authentication middleware for protected routes.
//!
//! A request authenticates with either:
//! - `Authorization: Bearer <jwt>`, validated by [`JwtValidator`]
//! - `X-API-Key: <userId>:<apiKey>`, checked against the stored key hash
//!
//! The resolved [`AuthenticatedUser`] is inserted into request extensions.

use crate::auth::JwtValidator;
use crate::errors::ApiError;
use crate::repositories::CredentialStore;
use crate::services::UserService;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Identity of the caller, set by [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i32,
}

/// State for the authentication middleware.
pub struct AuthState<S: CredentialStore> {
    pub jwt_validator: Arc<JwtValidator>,
    pub users: UserService<S>,
}

impl<S: CredentialStore> Clone for AuthState<S> {
    fn clone(&self) -> Self {
        Self {
            jwt_validator: Arc::clone(&self.jwt_validator),
            users: self.users.clone(),
        }
    }
}

fn extract_bearer_token(req: &Request) -> Result<&str, ApiError> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "api.middleware.auth", "Missing Authorization header");
            ApiError::InvalidToken("Missing Authorization header".to_string())
        })?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::debug!(target: "api.middleware.auth", "Invalid Authorization header format");
        ApiError::InvalidToken("Invalid Authorization header format".to_string())
    })
}

fn extract_api_key(req: &Request) -> Option<&str> {
    req.headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
}

/// Resolve the caller from an API key.
///
/// Unknown users and users without a key are reported as an invalid key so
/// the response does not reveal which user ids exist.
async fn authenticate_api_key<S: CredentialStore>(
    users: &UserService<S>,
    composite_key: &str,
) -> Result<i32, ApiError> {
    users
        .validate_composite_api_key(composite_key)
        .await
        .map_err(|e| match e {
            ApiError::UserNotFound | ApiError::AccessDenied => {
                tracing::debug!(target: "api.middleware.auth", "API key rejected");
                ApiError::UserApiTokenNotValid
            }
            other => other,
        })
}

/// Authentication middleware.
///
/// # Response
///
/// - Returns 401 Unauthorized if no credentials are present or they are invalid
/// - Continues to next handler with `AuthenticatedUser` in extensions otherwise
#[instrument(skip_all, name = "api.middleware.auth")]
pub async fn require_auth<S: CredentialStore>(
    State(state): State<Arc<AuthState<S>>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let api_key = extract_api_key(&req);

    let user_id = match api_key {
        Some(composite_key) => authenticate_api_key(&state.users, composite_key).await?,
        None => {
            let token = extract_bearer_token(&req)?;
            let claims = state.jwt_validator.validate(token).await?;
            claims.user_id().ok_or_else(|| {
                ApiError::InvalidToken("The access token is invalid".to_string())
            })?
        }
    };

    tracing::debug!(target: "api.middleware.auth", user_id, "Request authenticated");
    req.extensions_mut().insert(AuthenticatedUser { user_id });

    Ok(next.run(req).await)
}
