//! Project endpoints. Every operation is scoped to the caller's ACL entries.

use crate::errors::ApiError;
use crate::handlers::validation::validate_project_name;
use crate::middleware::AuthenticatedUser;
use crate::models::{NewProject, Project, ProjectChanges};
use crate::repositories::CredentialStore;
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/v1/projects
#[instrument(skip_all, name = "api.handlers.create_project")]
pub async fn create_project<S: CredentialStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(payload): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    validate_project_name(&payload.name)?;

    let project = state.projects.create(caller.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// Handler for GET /api/v1/projects
#[instrument(skip_all, name = "api.handlers.list_projects")]
pub async fn list_projects<S: CredentialStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state.projects.list(caller.user_id).await?;
    Ok(Json(projects))
}

/// Handler for GET /api/v1/projects/:id
#[instrument(skip_all, name = "api.handlers.get_project")]
pub async fn get_project<S: CredentialStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(project_id): Path<i32>,
) -> Result<Json<Project>, ApiError> {
    let project = state.projects.get(caller.user_id, project_id).await?;
    Ok(Json(project))
}

/// Handler for PATCH /api/v1/projects/:id
#[instrument(skip_all, name = "api.handlers.update_project")]
pub async fn update_project<S: CredentialStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(project_id): Path<i32>,
    Json(changes): Json<ProjectChanges>,
) -> Result<Json<Project>, ApiError> {
    if let Some(name) = &changes.name {
        validate_project_name(name)?;
    }

    let project = state
        .projects
        .update(caller.user_id, project_id, changes)
        .await?;
    Ok(Json(project))
}

/// Handler for DELETE /api/v1/projects/:id
#[instrument(skip_all, name = "api.handlers.delete_project")]
pub async fn delete_project<S: CredentialStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(project_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.projects.delete(caller.user_id, project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
