//! Metrics definitions for the API service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `api_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP methods
//! - `endpoint`: route templates, unknown paths collapse to `/other`
//! - `status`: success, error, timeout
//! - `result`: a handful of fixed values per metric
//! - `error_category`: [`ErrorCategory`](super::ErrorCategory) values

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return the handle served at `/metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("api_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `api_http_requests_total`, `api_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` / `status_code`
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let endpoint = normalize_endpoint(path);
    let status = categorize_status_code(status_code);

    histogram!("api_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("api_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Map a request path to its route template.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        "/api/v1/auth/register" => "/api/v1/auth/register",
        "/api/v1/auth/login" => "/api/v1/auth/login",
        "/api/v1/users/me" => "/api/v1/users/me",
        "/api/v1/users/me/api-key" => "/api/v1/users/me/api-key",
        "/api/v1/projects" => "/api/v1/projects",
        _ => match path.strip_prefix("/api/v1/projects/") {
            Some(rest) if !rest.is_empty() && !rest.contains('/') => "/api/v1/projects/{id}",
            _ => "/other",
        },
    }
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record a login attempt.
///
/// Metric: `api_login_total`
/// Labels: `status` (success, error)
pub fn record_login(status: &'static str) {
    counter!("api_login_total", "status" => status).increment(1);
}

/// Record a bearer-token validation.
///
/// Metric: `api_token_validations_total`
/// Labels: `status`, `error_category` ("none" on success)
pub fn record_token_validation(status: &'static str, error_category: Option<&'static str>) {
    counter!("api_token_validations_total",
        "status" => status,
        "error_category" => error_category.unwrap_or("none")
    )
    .increment(1);
}

/// Record a token cache lookup.
///
/// Metric: `api_token_cache_lookups_total`
/// Labels: `result` (hit, miss)
pub fn record_token_cache_lookup(result: &'static str) {
    counter!("api_token_cache_lookups_total", "result" => result).increment(1);
}

/// Record an API-key rotation.
///
/// Metric: `api_api_key_rotations_total`
/// Labels: `status` (success, error)
pub fn record_api_key_rotation(status: &'static str) {
    counter!("api_api_key_rotations_total", "status" => status).increment(1);
}

// ============================================================================
// Access Control Metrics
// ============================================================================

/// Record an ACL check.
///
/// Metric: `api_access_checks_total`
/// Labels: `result` (granted, denied)
pub fn record_access_check(result: &'static str) {
    counter!("api_access_checks_total", "result" => result).increment(1);
}
