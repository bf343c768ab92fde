//! Authentication middleware for Axum
//!
//! `require_auth` verifies the bearer token and attaches an
//! [`AuthenticatedIdentity`] to the request. `require_role` runs after it and
//! compares the attached role against the role a route requires.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::error::AuthError;
use crate::jwt::{Claims, Role, TokenCodec, TokenKind};

/// Identity attached to a request after its access token was verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedIdentity {
    pub subject: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedIdentity {
    /// Create from JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            role: claims.role,
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or(AuthError::MissingIdentity)
    }
}

/// Extract bearer token from authorization header
///
/// Only `Bearer <token>` is accepted; the scheme is case-insensitive.
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MissingCredential)?;

    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::MissingCredential);
    }

    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MissingCredential);
    }

    Ok(token)
}

/// Verifies access tokens on incoming requests
#[derive(Clone)]
pub struct AuthGate {
    codec: Arc<TokenCodec>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Authenticate a request from its headers.
    ///
    /// Every token-level failure is reported as [`AuthError::Unauthorized`];
    /// the specific reason is only logged and counted.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedIdentity, AuthError> {
        self.authenticate_at(headers, Utc::now())
    }

    pub fn authenticate_at(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        self.verify(headers, now).map_err(|err| {
            debug!(reason = err.reason(), "Rejected request: {}", err);
            metrics::counter!("tokengate_auth_rejections_total", "reason" => err.reason())
                .increment(1);

            match err {
                AuthError::MissingCredential => AuthError::MissingCredential,
                _ => AuthError::Unauthorized,
            }
        })
    }

    fn verify(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingCredential)?;

        let token = extract_bearer_token(header)?;
        let claims = self.codec.decode_at(token, now)?;

        if claims.kind != TokenKind::Access {
            return Err(AuthError::WrongTokenKind {
                expected: TokenKind::Access,
                found: claims.kind,
            });
        }

        Ok(AuthenticatedIdentity::from_claims(&claims))
    }
}

/// Authentication middleware
///
/// Rejects the request unless it carries a valid access token, otherwise
/// adds the [`AuthenticatedIdentity`] to request extensions.
pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = gate.authenticate(request.headers())?;

    debug!("Authenticated: {} ({})", identity.subject, identity.role);

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Compare an attached identity against a required role
pub fn check_role(
    identity: Option<&AuthenticatedIdentity>,
    required: Role,
) -> Result<(), AuthError> {
    let Some(identity) = identity else {
        error!("Role check for {} ran without an authenticated identity", required);
        return Err(AuthError::MissingIdentity);
    };

    if identity.role != required {
        debug!(
            "Forbidden: {} has role {}, {} required",
            identity.subject, identity.role, required
        );
        metrics::counter!("tokengate_auth_rejections_total", "reason" => "forbidden").increment(1);
        return Err(AuthError::Forbidden {
            required,
            actual: identity.role,
        });
    }

    Ok(())
}

/// Middleware to require a role; must be layered inside `require_auth`
pub async fn require_role(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    check_role(request.extensions().get::<AuthenticatedIdentity>(), required)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::{TokenIssuer, TokenLifetimes};
    use crate::jwt::tests::test_codec;
    use axum::{
        Router,
        body::Body,
        http::{HeaderValue, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use chrono::Duration;
    use tower::ServiceExt;

    async fn whoami(identity: AuthenticatedIdentity) -> String {
        format!("{}:{}", identity.subject, identity.role)
    }

    fn app(gate: AuthGate, role: Option<Role>) -> Router {
        let mut router = Router::new().route("/protected", get(whoami));
        if let Some(role) = role {
            router = router.route_layer(from_fn_with_state(role, require_role));
        }
        router.route_layer(from_fn_with_state(gate, require_auth))
    }

    fn setup() -> (AuthGate, TokenIssuer) {
        let codec = Arc::new(test_codec());
        (
            AuthGate::new(codec.clone()),
            TokenIssuer::new(codec, TokenLifetimes::default()),
        )
    }

    async fn call(router: Router, authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }

        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn message(body: &str) -> String {
        let value: serde_json::Value = serde_json::from_str(body).unwrap();
        value["message"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(extract_bearer_token("bearer abc").unwrap(), "abc");

        for header in ["", "Bear", "Bearer", "Bearer ", "Basic dXNlcjpwYXNz", "abc.def.ghi", "Bearer a b"] {
            assert!(
                matches!(extract_bearer_token(header), Err(AuthError::MissingCredential)),
                "header {:?} should be rejected",
                header
            );
        }
    }

    #[test]
    fn test_gate_attaches_identity() {
        let (gate, issuer) = setup();
        let pair = issuer.issue("alice", Role::Admin).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", pair.access_token)).unwrap(),
        );

        let identity = gate.authenticate(&headers).unwrap();
        assert_eq!(identity.subject, "alice");
        assert_eq!(identity.role, Role::Admin);
        assert!(identity.expires_at > identity.issued_at);
    }

    #[test]
    fn test_gate_collapses_token_errors() {
        let (gate, issuer) = setup();
        let pair = issuer.issue("alice", Role::Admin).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", pair.access_token)).unwrap(),
        );
        let later = Utc::now() + Duration::minutes(10);
        assert!(matches!(
            gate.authenticate_at(&headers, later),
            Err(AuthError::Unauthorized)
        ));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-token"));
        assert!(matches!(gate.authenticate(&headers), Err(AuthError::Unauthorized)));

        headers.remove(AUTHORIZATION);
        assert!(matches!(gate.authenticate(&headers), Err(AuthError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_valid_access_token() {
        let (gate, issuer) = setup();
        let pair = issuer.issue("alice", Role::Admin).unwrap();

        let (status, body) = call(app(gate, None), Some(&format!("Bearer {}", pair.access_token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice:admin");
    }

    #[tokio::test]
    async fn test_missing_header() {
        let (gate, _) = setup();

        let (status, body) = call(app(gate, None), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "Missing or malformed authorization header");
    }

    #[tokio::test]
    async fn test_token_without_bearer_prefix() {
        let (gate, issuer) = setup();
        let pair = issuer.issue("alice", Role::Admin).unwrap();

        let (status, body) = call(app(gate, None), Some(&pair.access_token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "Missing or malformed authorization header");
    }

    #[tokio::test]
    async fn test_refresh_token_rejected() {
        let (gate, issuer) = setup();
        let pair = issuer.issue("alice", Role::Admin).unwrap();

        let (status, body) = call(app(gate, None), Some(&format!("Bearer {}", pair.refresh_token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "Unauthorized");
    }

    #[tokio::test]
    async fn test_expired_access_token_rejected() {
        let (gate, issuer) = setup();
        let pair = issuer
            .issue_at("alice", Role::Admin, Utc::now() - Duration::minutes(5))
            .unwrap();

        let (status, body) = call(app(gate, None), Some(&format!("Bearer {}", pair.access_token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "Unauthorized");
    }

    #[tokio::test]
    async fn test_role_check() {
        let (gate, issuer) = setup();
        let user = issuer.issue("bob", Role::User).unwrap();
        let admin = issuer.issue("alice", Role::Admin).unwrap();

        let (status, body) = call(
            app(gate.clone(), Some(Role::Admin)),
            Some(&format!("Bearer {}", user.access_token)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(message(&body), "Forbidden");

        let (status, body) = call(
            app(gate, Some(Role::Admin)),
            Some(&format!("Bearer {}", admin.access_token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice:admin");
    }

    #[tokio::test]
    async fn test_role_check_runs_after_gate() {
        let (gate, _) = setup();

        // No credential: the gate answers before the role check sees anything
        let (status, _) = call(app(gate, Some(Role::User)), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_check_role_without_identity() {
        assert!(matches!(
            check_role(None, Role::Admin),
            Err(AuthError::MissingIdentity)
        ));
    }

    #[tokio::test]
    async fn test_role_check_standalone_is_server_error() {
        let router = Router::new()
            .route("/protected", get(|| async { "ok" }))
            .route_layer(from_fn_with_state(Role::Admin, require_role));

        let (status, _) = call(router, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
