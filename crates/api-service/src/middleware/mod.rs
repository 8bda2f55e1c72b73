//! HTTP middleware.
//!
//! - `auth` - bearer token / API key authentication for protected routes
//! - `http_metrics` - request counters and latency histograms

pub mod auth;
pub mod http_metrics;

pub use auth::{require_auth, AuthState, AuthenticatedUser};
pub use http_metrics::http_metrics_middleware;
