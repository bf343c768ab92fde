//! Configuration loading and management

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokengate_api::StaticAccount;
use tokengate_auth::{Role, TokenLifetimes};
use tracing::{info, warn};

/// Longest refresh window accepted without a warning (one day)
const MAX_RECOMMENDED_REFRESH_TTL_SECS: i64 = 86400;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token validity in seconds
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: i64,
    /// Refresh token validity in seconds
    #[serde(default = "default_refresh_token_ttl_secs")]
    pub refresh_token_ttl_secs: i64,
    /// Accounts allowed to log in
    #[serde(default = "default_accounts")]
    pub accounts: Vec<StaticAccount>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_token_ttl_secs: default_access_token_ttl_secs(),
            refresh_token_ttl_secs: default_refresh_token_ttl_secs(),
            accounts: default_accounts(),
        }
    }
}

impl AuthConfig {
    /// Validate the token settings and build the lifetimes
    pub fn lifetimes(&self) -> Result<TokenLifetimes> {
        if self.refresh_token_ttl_secs > MAX_RECOMMENDED_REFRESH_TTL_SECS {
            warn!(
                "refresh_token_ttl_secs {} exceeds one day",
                self.refresh_token_ttl_secs
            );
        }
        if self.refresh_token_ttl_secs <= self.access_token_ttl_secs {
            warn!("Refresh tokens do not outlive access tokens");
        }

        TokenLifetimes::from_secs(self.access_token_ttl_secs, self.refresh_token_ttl_secs)
            .context("Invalid token lifetimes")
    }

    /// Reject an empty secret and warn about the built-in one
    pub fn validate_secret(&self) -> Result<()> {
        if self.jwt_secret.is_empty() {
            bail!("auth.jwt_secret must not be empty");
        }
        if self.jwt_secret == default_jwt_secret() {
            warn!("Using the default JWT secret; set auth.jwt_secret or TOKENGATE_JWT_SECRET");
        }
        Ok(())
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Load the demo users at startup
    #[serde(default = "default_seed_sample_users")]
    pub seed_sample_users: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            seed_sample_users: default_seed_sample_users(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_jwt_secret() -> String {
    "change-me-in-production".to_string()
}

fn default_access_token_ttl_secs() -> i64 {
    60
}

fn default_refresh_token_ttl_secs() -> i64 {
    3600
}

fn default_accounts() -> Vec<StaticAccount> {
    vec![StaticAccount {
        email: "admin@example.com".to_string(),
        password: "admin".to_string(),
        role: Role::Admin,
    }]
}

fn default_seed_sample_users() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&content).with_context(|| format!("Failed to parse config file: {}", path))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
