//! Current-user profile and API-key rotation.

use crate::errors::ApiError;
use crate::handlers::validation::{validate_password, validate_username};
use crate::middleware::AuthenticatedUser;
use crate::models::{ApiKeyResponse, SafeUser, UserChanges};
use crate::repositories::CredentialStore;
use crate::routes::AppState;
use axum::{extract::State, Extension, Json};
use common::secret::ExposeSecret;
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /api/v1/users/me
#[instrument(skip_all, name = "api.handlers.get_me")]
pub async fn get_me<S: CredentialStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> Result<Json<SafeUser>, ApiError> {
    let user = state.users.get_safe_by_id(caller.user_id).await?;
    Ok(Json(user))
}

/// Handler for PATCH /api/v1/users/me
#[instrument(skip_all, name = "api.handlers.update_me")]
pub async fn update_me<S: CredentialStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(changes): Json<UserChanges>,
) -> Result<Json<SafeUser>, ApiError> {
    if let Some(username) = &changes.username {
        validate_username(username)?;
    }
    if let Some(password) = &changes.password {
        validate_password(password.expose_secret())?;
    }

    let user = state.users.update(caller.user_id, changes).await?;
    Ok(Json(user))
}

/// Handler for POST /api/v1/users/me/api-key
///
/// Returns the new key in composite `<userId>:<apiKey>` form. This response
/// is the only place the plaintext key ever appears.
#[instrument(skip_all, name = "api.handlers.rotate_api_key")]
pub async fn rotate_api_key<S: CredentialStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let api_key = state.users.update_api_key(caller.user_id).await?;

    Ok(Json(ApiKeyResponse {
        api_key: format!("{}:{}", caller.user_id, api_key.expose_secret()),
    }))
}
