//! keyhub - client for the API-key billing backend.
//!
//! - [`api`]: authenticated request client with single-flight token refresh,
//!   plus typed calls for auth, users, packages, API keys, usage and health.
//! - [`view`]: pure builders turning health and usage payloads into
//!   chart-ready view models.

pub mod api;
pub mod config;
pub mod models;
pub mod view;

pub use api::{ApiClient, ApiError};
pub use config::ClientConfig;
