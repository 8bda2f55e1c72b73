//! Service configuration.
//!
//! Loaded from environment variables. Secrets are held in `SecretSlice` and
//! every sensitive field is redacted in Debug output.

use base64::{engine::general_purpose, Engine as _};
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use common::secret::{ExposeSecret, SecretSlice};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Default bcrypt work factor for passwords and API keys.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Lowest bcrypt cost we accept.
pub const MIN_BCRYPT_COST: u32 = 10;

/// Highest bcrypt cost we accept (cost 15+ takes over a second per hash).
pub const MAX_BCRYPT_COST: u32 = 14;

/// Default access token lifetime (1 day).
pub const DEFAULT_JWT_EXPIRES_IN_SECONDS: u64 = 86_400;

/// Default absolute token age limit (7 days), measured from `iat`.
pub const DEFAULT_JWT_MAX_AGE_SECONDS: u64 = 604_800;

/// Upper bound for both the token lifetime and the absolute age limit (1 year).
pub const MAX_JWT_LIFETIME_SECONDS: u64 = 31_536_000;

/// Default JWT clock skew tolerance in seconds.
pub const DEFAULT_JWT_CLOCK_SKEW_SECONDS: i64 = DEFAULT_CLOCK_SKEW.as_secs() as i64;

/// Default token cache TTL.
pub const DEFAULT_TOKEN_CACHE_TTL_SECONDS: u64 = 300;

/// Default database pool size.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Minimum JWT signing secret length in bytes (HS256 key size).
pub const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// HS256 signing secret for access tokens.
    pub jwt_secret: SecretSlice<u8>,
    pub jwt_expires_in_seconds: u64,
    pub jwt_max_age_seconds: u64,
    pub jwt_clock_skew_seconds: i64,
    pub token_cache_ttl_seconds: u64,
    pub bcrypt_cost: u32,
    pub db_max_connections: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expires_in_seconds", &self.jwt_expires_in_seconds)
            .field("jwt_max_age_seconds", &self.jwt_max_age_seconds)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("token_cache_ttl_seconds", &self.token_cache_ttl_seconds)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("db_max_connections", &self.db_max_connections)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT secret: {0}")]
    InvalidJwtSecret(String),

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwt_secret_base64 = vars
            .get("JWT_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?;

        let jwt_secret = general_purpose::STANDARD
            .decode(jwt_secret_base64)
            .map_err(ConfigError::Base64Error)?;

        if jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::InvalidJwtSecret(format!(
                "Expected at least {} bytes, got {}",
                MIN_JWT_SECRET_BYTES,
                jwt_secret.len()
            )));
        }

        let jwt_expires_in_seconds = parse_positive(
            vars,
            "JWT_EXPIRES_IN_SECONDS",
            DEFAULT_JWT_EXPIRES_IN_SECONDS,
        )?;
        ensure_at_most(
            "JWT_EXPIRES_IN_SECONDS",
            jwt_expires_in_seconds,
            MAX_JWT_LIFETIME_SECONDS,
        )?;
        let jwt_max_age_seconds =
            parse_positive(vars, "JWT_MAX_AGE_SECONDS", DEFAULT_JWT_MAX_AGE_SECONDS)?;
        ensure_at_most(
            "JWT_MAX_AGE_SECONDS",
            jwt_max_age_seconds,
            MAX_JWT_LIFETIME_SECONDS,
        )?;
        let token_cache_ttl_seconds = parse_positive(
            vars,
            "TOKEN_CACHE_TTL_SECONDS",
            DEFAULT_TOKEN_CACHE_TTL_SECONDS,
        )?;
        let db_max_connections = parse_positive(
            vars,
            "DB_MAX_CONNECTIONS",
            u64::from(DEFAULT_DB_MAX_CONNECTIONS),
        )?;
        let db_max_connections =
            u32::try_from(db_max_connections).map_err(|_| ConfigError::InvalidValue {
                name: "DB_MAX_CONNECTIONS".to_string(),
                reason: "value out of range".to_string(),
            })?;

        let jwt_clock_skew_seconds = parse_positive(
            vars,
            "JWT_CLOCK_SKEW_SECONDS",
            DEFAULT_JWT_CLOCK_SKEW_SECONDS.unsigned_abs(),
        )?;
        ensure_at_most(
            "JWT_CLOCK_SKEW_SECONDS",
            jwt_clock_skew_seconds,
            MAX_CLOCK_SKEW.as_secs(),
        )?;
        // Bounded by MAX_CLOCK_SKEW above
        #[allow(clippy::cast_possible_wrap)]
        let jwt_clock_skew_seconds = jwt_clock_skew_seconds as i64;

        let bcrypt_cost = parse_positive(vars, "BCRYPT_COST", u64::from(DEFAULT_BCRYPT_COST))?;
        let bcrypt_cost = u32::try_from(bcrypt_cost)
            .ok()
            .filter(|c| (MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(c))
            .ok_or_else(|| ConfigError::InvalidValue {
                name: "BCRYPT_COST".to_string(),
                reason: format!(
                    "must be between {} and {}, got {}",
                    MIN_BCRYPT_COST, MAX_BCRYPT_COST, bcrypt_cost
                ),
            })?;

        Ok(Config {
            database_url,
            bind_address,
            jwt_secret: SecretSlice::from(jwt_secret),
            jwt_expires_in_seconds,
            jwt_max_age_seconds,
            jwt_clock_skew_seconds,
            token_cache_ttl_seconds,
            bcrypt_cost,
            db_max_connections,
        })
    }

    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret()
    }

    pub fn jwt_clock_skew(&self) -> Duration {
        Duration::from_secs(self.jwt_clock_skew_seconds.unsigned_abs())
    }

    pub fn jwt_max_age(&self) -> Duration {
        Duration::from_secs(self.jwt_max_age_seconds)
    }

    pub fn token_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.token_cache_ttl_seconds)
    }
}

/// Parse an optional positive integer variable, falling back to `default`.
fn parse_positive(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };

    let value = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

    if value == 0 {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(value)
}

fn ensure_at_most(name: &str, value: u64, max: u64) -> Result<(), ConfigError> {
    if value > max {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!("must be at most {} seconds, got {}", max, value),
        });
    }
    Ok(())
}
