//! Tokengate REST API
//!
//! This crate provides the Axum-based HTTP API: login and token refresh,
//! the protected user CRUD routes, health, metrics and the OpenAPI document.

pub mod credentials;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

pub use credentials::{Account, CredentialStore, StaticAccount, StaticCredentials};
pub use error::ApiError;
pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
