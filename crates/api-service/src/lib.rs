//! Boilerplate API service library.
//!
//! User registration, JWT and API-key authentication, per-resource access
//! control and project CRUD over PostgreSQL.
//!
//! # Modules
//!
//! - `auth` - Bearer token validation and the verified-token cache
//! - `config` - Service configuration
//! - `crypto` - Password/API-key hashing, key generation, JWT signing
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication and HTTP metrics middleware
//! - `models` - Data models
//! - `observability` - Metrics and log-field hashing
//! - `repositories` - Credential store trait and implementations
//! - `routes` - Router and application state
//! - `services` - Business logic layer

pub mod auth;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
