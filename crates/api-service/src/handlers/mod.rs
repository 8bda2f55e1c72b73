//! HTTP request handlers.

pub mod auth_handler;
pub mod health;
pub mod metrics;
pub mod projects;
pub mod users;
pub mod validation;

pub use auth_handler::{login, register};
pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use projects::{create_project, delete_project, get_project, list_projects, update_project};
pub use users::{get_me, rotate_api_key, update_me};
