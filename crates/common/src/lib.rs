//! Types and rules shared between the API service and its test tooling.

#![warn(clippy::pedantic)]

/// Secret types that prevent accidental logging
pub mod secret;

/// JWT policy: size limits, `iat` validation, max age, user claims
pub mod jwt;
