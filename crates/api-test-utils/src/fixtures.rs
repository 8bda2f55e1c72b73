//! Fixed test configuration and credentials.
//!
//! Everything here is deterministic so test runs are reproducible.

use api_service::config::Config;
use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;

/// HS256 secret shared by the test server and [`TestTokenBuilder`](crate::TestTokenBuilder).
pub const TEST_JWT_SECRET: &[u8] = b"test-jwt-secret-do-not-use-in-prod!!";

pub const TEST_USERNAME_ALICE: &str = "alice";
pub const TEST_USERNAME_BOB: &str = "bob";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Environment for a test server. The database URL is never dialled.
pub fn test_config_vars() -> HashMap<String, String> {
    HashMap::from([
        (
            "DATABASE_URL".to_string(),
            "postgresql://test/test".to_string(),
        ),
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        (
            "JWT_SECRET".to_string(),
            general_purpose::STANDARD.encode(TEST_JWT_SECRET),
        ),
        ("JWT_EXPIRES_IN_SECONDS".to_string(), "3600".to_string()),
        ("JWT_MAX_AGE_SECONDS".to_string(), "7200".to_string()),
        ("BCRYPT_COST".to_string(), "10".to_string()),
    ])
}

pub fn test_config() -> Result<Config, anyhow::Error> {
    Config::from_vars(&test_config_vars())
        .map_err(|e| anyhow::anyhow!("Failed to create test config: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_loads() {
        let config = test_config().unwrap();
        assert_eq!(config.jwt_secret_bytes(), TEST_JWT_SECRET);
        assert_eq!(config.jwt_expires_in_seconds, 3600);
    }

    #[test]
    fn test_secret_is_long_enough() {
        assert!(TEST_JWT_SECRET.len() >= api_service::config::MIN_JWT_SECRET_BYTES);
    }
}
