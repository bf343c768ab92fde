//! Authentication routes

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tokengate_auth::{AuthError, AuthenticatedIdentity, RefreshedToken, TokenPair, require_auth};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginRequest, MessageResponse, RefreshRequest};

// ==================== Input Validation ====================

/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;

fn validate_login(request: &LoginRequest) -> Result<(), ApiError> {
    if request.email.trim().is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    if request.email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        )));
    }
    if request.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn invalid_payload(rejection: JsonRejection) -> ApiError {
    debug!("Rejected request body: {}", rejection.body_text());
    ApiError::BadRequest("Invalid request payload".to_string())
}

// ==================== Auth Routes ====================

/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access and refresh token pair", body = TokenPair),
        (status = 400, description = "Malformed or empty input", body = MessageResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(request) = payload.map_err(invalid_payload)?;
    validate_login(&request)?;

    debug!("Login attempt for: {}", request.email);

    let Some(account) = state
        .credentials
        .verify(&request.email, &request.password)
        .await?
    else {
        metrics::counter!("tokengate_logins_total", "outcome" => "failure").increment(1);
        return Err(AuthError::InvalidCredentials.into());
    };

    let pair = state.issuer.issue(&account.subject, account.role)?;

    metrics::counter!("tokengate_logins_total", "outcome" => "success").increment(1);
    info!("{} logged in ({})", account.subject, account.role);

    Ok(Json(pair))
}

/// POST /api/v1/auth/refresh
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshedToken),
        (status = 400, description = "Malformed body or empty refresh token", body = MessageResponse),
        (status = 401, description = "Refresh token rejected", body = MessageResponse)
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshedToken>, ApiError> {
    let Json(request) = payload.map_err(invalid_payload)?;
    if request.refresh_token.is_empty() {
        return Err(ApiError::BadRequest("refreshToken is required".to_string()));
    }

    let token = state
        .refresher
        .refresh(&request.refresh_token)
        .inspect_err(|e| debug!(reason = e.reason(), "Refresh rejected: {}", e))?;

    Ok(Json(token))
}

/// GET /api/v1/me
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Identity of the access token", body = AuthenticatedIdentity),
        (status = 401, description = "Missing or invalid access token", body = MessageResponse)
    )
)]
pub async fn me(identity: AuthenticatedIdentity) -> Json<AuthenticatedIdentity> {
    Json(identity)
}

/// Create auth routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/v1/me", get(me))
        .route_layer(from_fn_with_state(state.gate.clone(), require_auth));

    Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/refresh", post(refresh))
        .merge(protected)
}
