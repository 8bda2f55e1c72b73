//! # API Test Utilities
//!
//! Shared test utilities for the API service:
//! - Fixed configuration and credentials (`fixtures`)
//! - Hand-crafted JWTs with arbitrary claims (`TestTokenBuilder`)
//! - A real server over the in-memory store (`TestApiServer`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use api_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestApiServer::spawn().await?;
//!     let token = server.register_and_login(TEST_USERNAME_ALICE, TEST_PASSWORD).await?;
//!
//!     let expired = TestTokenBuilder::new().for_user_id(1).expires_in(-60).sign();
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod server_harness;
pub mod token_builders;

pub use fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
