//! Application state

use std::sync::Arc;
use tokengate_auth::{AuthGate, SecretKey, TokenCodec, TokenIssuer, TokenLifetimes, TokenRefresher};
use tokengate_db::Database;

use crate::credentials::CredentialStore;

/// Prometheus handle rendered by the `/metrics` route
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub credentials: Arc<dyn CredentialStore>,
    pub issuer: Arc<TokenIssuer>,
    pub refresher: Arc<TokenRefresher>,
    pub gate: AuthGate,
}

impl AppState {
    /// Build the auth components around one shared codec
    pub fn new(
        db: Database,
        credentials: Arc<dyn CredentialStore>,
        secret: &SecretKey,
        lifetimes: TokenLifetimes,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(secret));

        Self {
            db,
            credentials,
            issuer: Arc::new(TokenIssuer::new(codec.clone(), lifetimes)),
            refresher: Arc::new(TokenRefresher::new(codec.clone(), lifetimes.access())),
            gate: AuthGate::new(codec),
        }
    }
}
