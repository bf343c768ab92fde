//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::jwt::{Role, TokenKind};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing or malformed authorization header")]
    MissingCredential,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Unsupported signing algorithm: {0}")]
    AlgorithmMismatch(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Wrong token kind: expected {expected}, found {found}")]
    WrongTokenKind { expected: TokenKind, found: TokenKind },

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("No authenticated identity attached to request")]
    MissingIdentity,

    #[error("Role {actual} is not allowed, {required} required")]
    Forbidden { required: Role, actual: Role },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token signing failed: {0}")]
    SigningFailed(String),

    #[error("Invalid auth configuration: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Short machine-readable reason, used as a metrics label and in logs
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::Malformed(_) => "malformed",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::AlgorithmMismatch(_) => "algorithm_mismatch",
            AuthError::TokenExpired => "token_expired",
            AuthError::WrongTokenKind { .. } => "wrong_token_kind",
            AuthError::InvalidOrExpiredToken => "invalid_or_expired_token",
            AuthError::Unauthorized => "unauthorized",
            AuthError::MissingIdentity => "missing_identity",
            AuthError::Forbidden { .. } => "forbidden",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::SigningFailed(_) => "signing_failed",
            AuthError::Configuration(_) => "configuration",
        }
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::MissingIdentity
            | AuthError::SigningFailed(_)
            | AuthError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message safe to return to a client
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "Missing or malformed authorization header",
            AuthError::TokenExpired => "Token expired",
            AuthError::WrongTokenKind { .. } => "Invalid token type",
            AuthError::InvalidOrExpiredToken => "Invalid or expired token",
            AuthError::Forbidden { .. } => "Forbidden",
            AuthError::InvalidCredentials => "Invalid credentials",
            AuthError::MissingIdentity
            | AuthError::SigningFailed(_)
            | AuthError::Configuration(_) => "Internal error",
            AuthError::Malformed(_)
            | AuthError::SignatureInvalid
            | AuthError::AlgorithmMismatch(_)
            | AuthError::Unauthorized => "Unauthorized",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = axum::Json(json!({
            "message": self.public_message()
        }));

        (self.status(), body).into_response()
    }
}
