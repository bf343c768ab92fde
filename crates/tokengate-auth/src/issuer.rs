//! Access/refresh token pair issuance

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::AuthError;
use crate::jwt::{Claims, Role, TokenCodec, TokenKind};

/// Default access token validity (1 minute)
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 60;
/// Default refresh token validity (1 hour)
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 3600;
/// Longest accepted validity for either token (365 days)
pub const MAX_TTL_SECS: i64 = 365 * 24 * 3600;

/// Validity windows for issued tokens
#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    access: Duration,
    refresh: Duration,
}

impl TokenLifetimes {
    /// Both windows must be positive and at most [`MAX_TTL_SECS`].
    pub fn new(access: Duration, refresh: Duration) -> Result<Self, AuthError> {
        check_window("access", access)?;
        check_window("refresh", refresh)?;
        Ok(Self { access, refresh })
    }

    pub fn from_secs(access_secs: i64, refresh_secs: i64) -> Result<Self, AuthError> {
        Self::new(
            seconds("access", access_secs)?,
            seconds("refresh", refresh_secs)?,
        )
    }

    pub fn access(&self) -> Duration {
        self.access
    }

    pub fn refresh(&self) -> Duration {
        self.refresh
    }
}

fn seconds(name: &str, secs: i64) -> Result<Duration, AuthError> {
    Duration::try_seconds(secs).ok_or_else(|| {
        AuthError::Configuration(format!("{} token lifetime of {}s is out of range", name, secs))
    })
}

fn check_window(name: &str, ttl: Duration) -> Result<(), AuthError> {
    if ttl <= Duration::zero() {
        return Err(AuthError::Configuration(format!(
            "{} token lifetime must be positive",
            name
        )));
    }
    if ttl > Duration::seconds(MAX_TTL_SECS) {
        return Err(AuthError::Configuration(format!(
            "{} token lifetime must not exceed {}s",
            name, MAX_TTL_SECS
        )));
    }
    Ok(())
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            refresh: Duration::seconds(DEFAULT_REFRESH_TTL_SECS),
        }
    }
}

/// Access token + refresh token pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token validity in seconds
    pub expires_in: i64,
}

/// Issues token pairs for verified accounts
#[derive(Clone)]
pub struct TokenIssuer {
    codec: Arc<TokenCodec>,
    lifetimes: TokenLifetimes,
}

impl TokenIssuer {
    pub fn new(codec: Arc<TokenCodec>, lifetimes: TokenLifetimes) -> Self {
        Self { codec, lifetimes }
    }

    pub fn lifetimes(&self) -> TokenLifetimes {
        self.lifetimes
    }

    /// Issue a token pair for an already verified subject
    pub fn issue(&self, subject: &str, role: Role) -> Result<TokenPair, AuthError> {
        self.issue_at(subject, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        let access = Claims::new(subject, role, TokenKind::Access, now, self.lifetimes.access)?;
        let refresh = Claims::new(subject, role, TokenKind::Refresh, now, self.lifetimes.refresh)?;

        let access_token = self.codec.encode(&access)?;
        let refresh_token = self.codec.encode(&refresh)?;

        debug!("Issued token pair for {} ({})", subject, role);
        metrics::counter!("tokengate_tokens_issued_total", "kind" => "access").increment(1);
        metrics::counter!("tokengate_tokens_issued_total", "kind" => "refresh").increment(1);

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.lifetimes.access.num_seconds(),
        })
    }
}
