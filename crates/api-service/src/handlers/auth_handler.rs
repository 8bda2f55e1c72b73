//! Registration and login.

use crate::errors::ApiError;
use crate::handlers::validation::{validate_password, validate_username};
use crate::models::{NewUser, SafeUser, TokenResponse};
use crate::observability::metrics::record_login;
use crate::repositories::CredentialStore;
use crate::routes::AppState;
use crate::services::token_service;
use axum::{extract::State, http::StatusCode, Json};
use common::secret::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: SecretString,
}

/// Handler for POST /api/v1/auth/register
#[instrument(skip_all, name = "api.handlers.register")]
pub async fn register<S: CredentialStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(payload): Json<NewUser>,
) -> Result<(StatusCode, Json<SafeUser>), ApiError> {
    validate_username(&payload.username)?;
    validate_password(payload.password.expose_secret())?;

    let user = state.users.create(payload).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Handler for POST /api/v1/auth/login
///
/// An unknown username and a wrong password produce the same 401 response.
#[instrument(skip_all, name = "api.handlers.login")]
pub async fn login<S: CredentialStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let result = state
        .users
        .get_by_credentials(&payload.username, payload.password.expose_secret())
        .await;

    let user = match result {
        Ok(user) => user,
        Err(ApiError::UserNotFound) | Err(ApiError::UserCredentialsNotValid) => {
            record_login("error");
            return Err(ApiError::UserCredentialsNotValid);
        }
        Err(e) => {
            record_login("error");
            return Err(e);
        }
    };

    let token = token_service::issue_user_token(
        &user,
        state.config.jwt_secret_bytes(),
        state.config.jwt_expires_in_seconds,
    )?;

    record_login("success");
    Ok(Json(token))
}
