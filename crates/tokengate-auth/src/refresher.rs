//! Access token renewal from a refresh token
//!
//! Refresh tokens are not rotated: one stays usable until its own expiry.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::AuthError;
use crate::jwt::{Claims, TokenCodec, TokenKind};

/// Newly issued access token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Exchanges refresh tokens for new access tokens
#[derive(Clone)]
pub struct TokenRefresher {
    codec: Arc<TokenCodec>,
    access_ttl: Duration,
}

impl TokenRefresher {
    pub fn new(codec: Arc<TokenCodec>, access_ttl: Duration) -> Self {
        Self { codec, access_ttl }
    }

    pub fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, AuthError> {
        self.refresh_at(refresh_token, Utc::now())
    }

    pub fn refresh_at(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<RefreshedToken, AuthError> {
        let claims = self.codec.decode_at(refresh_token, now).map_err(|e| {
            debug!("Refresh token rejected: {}", e);
            AuthError::InvalidOrExpiredToken
        })?;

        if claims.kind != TokenKind::Refresh {
            return Err(AuthError::WrongTokenKind {
                expected: TokenKind::Refresh,
                found: claims.kind,
            });
        }

        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }

        let access = Claims::new(claims.sub, claims.role, TokenKind::Access, now, self.access_ttl)?;
        let access_token = self.codec.encode(&access)?;

        debug!("Refreshed access token for {}", access.sub);
        metrics::counter!("tokengate_tokens_issued_total", "kind" => "access").increment(1);

        Ok(RefreshedToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::{TokenIssuer, TokenLifetimes};
    use crate::jwt::Role;
    use crate::jwt::tests::test_codec;

    fn setup() -> (Arc<TokenCodec>, TokenIssuer, TokenRefresher) {
        let codec = Arc::new(test_codec());
        let lifetimes = TokenLifetimes::default();
        let issuer = TokenIssuer::new(codec.clone(), lifetimes);
        let refresher = TokenRefresher::new(codec.clone(), lifetimes.access());
        (codec, issuer, refresher)
    }

    #[test]
    fn test_issue_then_refresh() {
        let (codec, issuer, refresher) = setup();
        let login_time = Utc::now() - Duration::seconds(30);
        let pair = issuer.issue_at("alice", Role::Admin, login_time).unwrap();

        let original = codec.decode(&pair.access_token).unwrap();
        assert_eq!(original.sub, "alice");
        assert_eq!(original.role, Role::Admin);
        assert_eq!(original.kind, TokenKind::Access);

        let refreshed = refresher.refresh(&pair.refresh_token).unwrap();
        let renewed = codec.decode(&refreshed.access_token).unwrap();

        assert_eq!(renewed.sub, "alice");
        assert_eq!(renewed.role, Role::Admin);
        assert_eq!(renewed.kind, TokenKind::Access);
        assert!(renewed.iat > original.iat);
        assert_eq!(refreshed.expires_in, 60);
    }

    #[test]
    fn test_refresh_token_is_reusable() {
        let (_, issuer, refresher) = setup();
        let pair = issuer.issue("bob", Role::User).unwrap();

        assert!(refresher.refresh(&pair.refresh_token).is_ok());
        assert!(refresher.refresh(&pair.refresh_token).is_ok());
    }

    #[test]
    fn test_access_token_rejected() {
        let (_, issuer, refresher) = setup();
        let pair = issuer.issue("alice", Role::User).unwrap();

        assert!(matches!(
            refresher.refresh(&pair.access_token),
            Err(AuthError::WrongTokenKind {
                expected: TokenKind::Refresh,
                found: TokenKind::Access
            })
        ));
    }

    #[test]
    fn test_expired_refresh_token() {
        let (_, issuer, refresher) = setup();
        let pair = issuer
            .issue_at("alice", Role::User, Utc::now() - Duration::hours(2))
            .unwrap();

        assert!(matches!(
            refresher.refresh(&pair.refresh_token),
            Err(AuthError::InvalidOrExpiredToken)
        ));
    }

    #[test]
    fn test_garbage_and_foreign_tokens() {
        let (_, _, refresher) = setup();
        assert!(matches!(
            refresher.refresh("not-a-token"),
            Err(AuthError::InvalidOrExpiredToken)
        ));

        let foreign_codec = Arc::new(TokenCodec::new(&crate::jwt::SecretKey::new("other")));
        let foreign = TokenIssuer::new(foreign_codec, TokenLifetimes::default())
            .issue("alice", Role::Admin)
            .unwrap();
        assert!(matches!(
            refresher.refresh(&foreign.refresh_token),
            Err(AuthError::InvalidOrExpiredToken)
        ));
    }
}
