//! JWT token encoding and verification

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::AuthError;

/// Algorithm used when signing
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// HMAC algorithms accepted when verifying
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Shared HMAC signing secret
#[derive(Clone)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(secret.as_ref().to_vec())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Role carried in a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(AuthError::Configuration(format!("unknown role: {}", s))),
        }
    }
}

/// Purpose of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account email)
    pub sub: String,
    /// Account role
    pub role: Role,
    /// Token kind
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Build claims valid for `ttl` starting at `issued_at`.
    ///
    /// `ttl` must be positive so that `exp > iat`.
    pub fn new(
        subject: impl Into<String>,
        role: Role,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, AuthError> {
        debug_assert!(ttl > Duration::zero());
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::SigningFailed("token expiry out of range".to_string()))?;

        Ok(Self {
            sub: subject.into(),
            role,
            kind,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// A token is no longer valid from the second it expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Signs and verifies tokens with a single shared secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    key_configured: bool,
}

impl TokenCodec {
    pub fn new(secret: &SecretKey) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        // Expiry is checked in decode_at against the caller's clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(&secret.0),
            decoding_key: DecodingKey::from_secret(&secret.0),
            validation,
            key_configured: !secret.is_empty(),
        }
    }

    /// Sign claims into a compact token
    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        if !self.key_configured {
            return Err(AuthError::SigningFailed(
                "signing secret is not configured".to_string(),
            ));
        }

        debug!("Encoding {} token for {}", claims.kind, claims.sub);

        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| AuthError::SigningFailed(e.to_string()))
    }

    /// Verify a token and return its claims
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify a token, treating `now` as the current time
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let alg = declared_algorithm(token)?;
        match Algorithm::from_str(&alg) {
            Ok(a) if ACCEPTED_ALGORITHMS.contains(&a) => {}
            _ => return Err(AuthError::AlgorithmMismatch(alg)),
        }

        // An empty secret would verify tokens anyone can forge.
        if !self.key_configured {
            return Err(AuthError::SignatureInvalid);
        }

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(map_jwt_error)?;

        if token_data.claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }

        Ok(token_data.claims)
    }
}

/// Read the `alg` field of the header segment without trusting anything else
fn declared_algorithm(token: &str) -> Result<String, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(AuthError::Malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(segments[0])
        .map_err(|e| AuthError::Malformed(format!("header is not base64url: {}", e)))?;
    let header: RawHeader = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::Malformed(format!("header is not valid JSON: {}", e)))?;

    Ok(header.alg)
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            AuthError::AlgorithmMismatch(err.to_string())
        }
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::Malformed(err.to_string()),
    }
}
