//! Liveness and readiness checks.
//!
//! - `/health`: the process is up; checks nothing
//! - `/ready`: the credential store answers a round trip

use crate::repositories::CredentialStore;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn health_check() -> &'static str {
    "OK"
}

/// Returns 200 when the store is reachable, 503 otherwise.
///
/// The failure body is generic; the underlying error is logged.
#[tracing::instrument(skip_all, name = "api.health.readiness")]
pub async fn readiness_check<S: CredentialStore>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    if let Err(e) = state.store.ping().await {
        tracing::warn!(target: "api.health", error = %e, "Readiness check failed");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                database: "unhealthy",
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            database: "healthy",
            error: None,
        }),
    )
}
