//! Tokengate Authentication and Authorization
//!
//! This crate provides HMAC-signed JWT access/refresh tokens and the
//! Axum middleware that guards protected routes by token and role.

pub mod error;
pub mod issuer;
pub mod jwt;
pub mod middleware;
pub mod refresher;

pub use error::AuthError;
pub use issuer::{TokenIssuer, TokenLifetimes, TokenPair};
pub use jwt::{Claims, Role, SecretKey, TokenCodec, TokenKind};
pub use middleware::{
    AuthGate, AuthenticatedIdentity, check_role, extract_bearer_token, require_auth, require_role,
};
pub use refresher::{RefreshedToken, TokenRefresher};
