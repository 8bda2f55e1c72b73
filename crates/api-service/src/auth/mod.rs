//! Bearer token validation and the verified-token cache.

pub mod jwt;
pub mod token_cache;

pub use jwt::JwtValidator;
pub use token_cache::TokenCache;
