//! Secret types for values that must never reach a log line.
//!
//! Re-exports [`secrecy`]. `SecretString` and `SecretBox<T>` redact
//! themselves in `Debug`, so a struct that derives `Debug` while holding a
//! password or API key stays safe to log, and the inner value is zeroized
//! on drop.
//!
//! Use `SecretString` for:
//! - Passwords submitted at registration, login and profile update
//! - Freshly generated API keys (plaintext is handed out exactly once)
//! - Bearer tokens
//!
//! Use `SecretSlice<u8>` for binary key material such as the JWT
//! signing secret, and `SecretBox<T>` for other custom secret types.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct LoginRequest {
//!     username: String,
//!     password: SecretString,
//! }
//!
//! let req: LoginRequest =
//!     serde_json::from_str(r#"{"username": "alice", "password": "pw1"}"#).unwrap();
//! assert!(!format!("{req:?}").contains("pw1"));
//! assert_eq!(req.password.expose_secret(), "pw1");
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretSlice, SecretString};
