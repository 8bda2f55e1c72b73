//! HTTP routes and application state.

use crate::auth::JwtValidator;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_auth, AuthState};
use crate::repositories::CredentialStore;
use crate::services::{AccessControlService, ProjectService, UserService};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
///
/// Services are built once at startup over a single store.
pub struct AppState<S: CredentialStore> {
    pub store: Arc<S>,
    pub config: Config,
    pub users: UserService<S>,
    pub projects: ProjectService<S>,
    pub jwt_validator: Arc<JwtValidator>,
}

impl<S: CredentialStore> AppState<S> {
    pub fn new(store: Arc<S>, config: Config) -> Self {
        let users = UserService::new(Arc::clone(&store), config.bcrypt_cost);
        let access = AccessControlService::new(Arc::clone(&store));
        let projects = ProjectService::new(Arc::clone(&store), access);
        let jwt_validator = Arc::new(JwtValidator::from_config(&config));

        Self {
            store,
            config,
            users,
            projects,
            jwt_validator,
        }
    }
}

impl<S: CredentialStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            users: self.users.clone(),
            projects: self.projects.clone(),
            jwt_validator: Arc::clone(&self.jwt_validator),
        }
    }
}

/// Build the application routes.
///
/// - `/health`, `/ready`, `/metrics` - public, unversioned
/// - `/api/v1/auth/register`, `/api/v1/auth/login` - public
/// - `/api/v1/users/me[/api-key]` - authenticated
/// - `/api/v1/projects[/:id]` - authenticated, ACL-checked per project
/// - TraceLayer, HTTP metrics, 30 second request timeout
pub fn build_routes<S: CredentialStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let auth_state = Arc::new(AuthState {
        jwt_validator: Arc::clone(&state.jwt_validator),
        users: state.users.clone(),
    });

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check::<S>))
        .route("/api/v1/auth/register", post(handlers::register::<S>))
        .route("/api/v1/auth/login", post(handlers::login::<S>))
        .with_state(Arc::clone(&state));

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route(
            "/api/v1/users/me",
            get(handlers::get_me::<S>).patch(handlers::update_me::<S>),
        )
        .route(
            "/api/v1/users/me/api-key",
            post(handlers::rotate_api_key::<S>),
        )
        .route(
            "/api/v1/projects",
            post(handlers::create_project::<S>).get(handlers::list_projects::<S>),
        )
        .route(
            "/api/v1/projects/:id",
            get(handlers::get_project::<S>)
                .patch(handlers::update_project::<S>)
                .delete(handlers::delete_project::<S>),
        )
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth::<S>))
        .with_state(state);

    // Layer order (bottom-to-top execution): timeout, trace, metrics outermost
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
