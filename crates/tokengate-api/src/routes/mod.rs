//! API routes

pub(crate) mod auth;
pub(crate) mod health;
pub mod metrics;
pub(crate) mod types;
pub(crate) mod users;

use axum::Router;
use std::sync::Arc;

use crate::openapi::swagger_ui_router;
use crate::state::{AppState, MetricsHandle};

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Login, refresh and identity
        .merge(auth::routes(&state))
        // User CRUD
        .merge(users::routes(&state))
        .with_state(state)
        // API docs
        .merge(swagger_ui_router());

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
