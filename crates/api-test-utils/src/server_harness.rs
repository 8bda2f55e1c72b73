//! Test server harness for end-to-end HTTP tests.
//!
//! Spawns the real router on a random port, backed by the in-memory
//! credential store so tests need no database.

use crate::fixtures::test_config_vars;
use api_service::config::Config;
use api_service::models::{SafeUser, TokenResponse};
use api_service::repositories::MemoryStore;
use api_service::routes::{self, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the API server in E2E tests.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<(), anyhow::Error> {
///     let server = TestApiServer::spawn().await?;
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestApiServer {
    addr: SocketAddr,
    client: reqwest::Client,
    store: Arc<MemoryStore>,
    config: Config,
    handle: JoinHandle<()>,
}

impl TestApiServer {
    /// Spawn a server with the default test configuration.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(test_config_vars()).await
    }

    /// Spawn a server with custom configuration variables.
    pub async fn spawn_with_vars(vars: HashMap<String, String>) -> Result<Self, anyhow::Error> {
        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState::new(Arc::clone(&store), config.clone()));

        // A detached recorder; installing the global one would fail on the
        // second server in the same test binary.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        Ok(Self {
            addr,
            client: reqwest::Client::new(),
            store,
            config,
            handle,
        })
    }

    /// Base URL of the server (e.g. "http://127.0.0.1:12345").
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The store behind the server, for seeding or inspecting state directly.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// POST /api/v1/auth/register, returning the raw response.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<reqwest::Response, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/api/v1/auth/register", self.url()))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        Ok(response)
    }

    /// POST /api/v1/auth/login, returning the raw response.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<reqwest::Response, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/api/v1/auth/login", self.url()))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        Ok(response)
    }

    /// Register a user, asserting success, and return the created profile.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SafeUser, anyhow::Error> {
        let response = self.register(username, password).await?;
        anyhow::ensure!(
            response.status() == reqwest::StatusCode::CREATED,
            "register returned {}",
            response.status()
        );
        Ok(response.json().await?)
    }

    /// Register then log in, returning a bearer token.
    pub async fn register_and_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, anyhow::Error> {
        self.create_user(username, password).await?;

        let response = self.login(username, password).await?;
        anyhow::ensure!(
            response.status() == reqwest::StatusCode::OK,
            "login returned {}",
            response.status()
        );
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Rotate the API key of the bearer's user, returning the composite key.
    pub async fn rotate_api_key(&self, bearer: &str) -> Result<String, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/api/v1/users/me/api-key", self.url()))
            .bearer_auth(bearer)
            .send()
            .await?;
        anyhow::ensure!(
            response.status() == reqwest::StatusCode::OK,
            "api-key rotation returned {}",
            response.status()
        );
        let body: ApiKeyBody = response.json().await?;
        Ok(body.api_key)
    }
}

// The service's response type is serialize-only.
#[derive(Deserialize)]
struct ApiKeyBody {
    api_key: String,
}

impl Drop for TestApiServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
