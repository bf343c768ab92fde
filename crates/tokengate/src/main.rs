//! Tokengate - JWT access/refresh token service guarding a user directory

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;
use tokengate_api::{AppState, StaticCredentials, create_router};
use tokengate_auth::SecretKey;
use tokengate_db::Database;

/// Tokengate - stateless JWT authentication in front of a user directory
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "TOKENGATE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "TOKENGATE_PORT")]
    port: Option<u16>,

    /// Token signing secret (overrides auth.jwt_secret)
    #[arg(long, env = "TOKENGATE_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(secret) = args.jwt_secret {
        config.auth.jwt_secret = secret;
    }

    // Initialize logging
    init_logging(&config.logging.level, &config.logging.format);

    info!("Starting Tokengate v{}", env!("CARGO_PKG_VERSION"));

    // Token settings
    config.auth.validate_secret()?;
    let lifetimes = config.auth.lifetimes()?;
    let secret = SecretKey::new(&config.auth.jwt_secret);
    info!(
        "Access tokens valid for {}s, refresh tokens for {}s",
        lifetimes.access().num_seconds(),
        lifetimes.refresh().num_seconds()
    );

    // Initialize user store
    let db = Database::new();
    if config.database.seed_sample_users {
        db.seed_sample_users()
            .context("Failed to seed sample users")?;
    }

    // Login accounts
    let credentials = StaticCredentials::new(config.auth.accounts.clone());
    if credentials.is_empty() {
        warn!("No accounts configured; login will always fail");
    } else {
        info!("{} login accounts configured", credentials.len());
    }

    // Metrics recorder
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;

    // Create application state
    let state = AppState::new(db, Arc::new(credentials), &secret, lifetimes);

    // Create router
    let app = create_router(state, Some(Arc::new(metrics_handle)))
        .layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind_addr, port))?;

    info!("Listening on {}", addr);
    info!("Swagger UI available at http://{}/swagger/", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
