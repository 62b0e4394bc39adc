//! Grant Service Library
//!
//! Issues short-lived grants that admit exactly one participant to exactly
//! one interview room on the real-time transport.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/grant_service.rs -> crypto
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `crypto` - Grant signing and random name suffixes
//! - `handlers` - HTTP request handlers
//! - `models` - Request and response bodies
//! - `observability` - Metrics and log correlation helpers
//! - `routes` - Axum router setup
//! - `services` - Grant issuance

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
