//! User management routes
//!
//! Every route requires an access token; writes additionally require the
//! admin role.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use tokengate_auth::{AuthenticatedIdentity, Role, require_auth, require_role};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{CreateUserRequest, MessageResponse, UpdateUserRequest, UserResponse};

fn user_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::BadRequest("Invalid user ID".to_string()))
}

fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!("Rejected request body: {}", rejection.body_text());
        ApiError::BadRequest("Invalid request payload".to_string())
    })
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

// ==================== User Routes ====================

/// GET /api/v1/users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users ordered by id", body = [UserResponse]),
        (status = 401, description = "Missing or invalid access token", body = MessageResponse),
        (status = 404, description = "No users found", body = MessageResponse)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.db.list_users();
    if users.is_empty() {
        return Err(ApiError::NotFound("No users found".to_string()));
    }

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/v1/users/{id}
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Invalid user ID", body = MessageResponse),
        (status = 401, description = "Missing or invalid access token", body = MessageResponse),
        (status = 404, description = "User not found", body = MessageResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = user_id(path)?;

    let user = state.db.get_user_by_id(id).ok_or_else(user_not_found)?;
    Ok(Json(user.into()))
}

/// POST /api/v1/users (Admin only)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid payload or missing name", body = MessageResponse),
        (status = 401, description = "Missing or invalid access token", body = MessageResponse),
        (status = 403, description = "Admin role required", body = MessageResponse)
    )
)]
pub async fn create_user(
    identity: AuthenticatedIdentity,
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let request = payload(body)?;

    let user = state.db.insert_user(request.into())?;

    info!("{} created user {}", identity.subject, user.id);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /api/v1/users/{id} (Admin only)
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid ID, payload or missing name", body = MessageResponse),
        (status = 401, description = "Missing or invalid access token", body = MessageResponse),
        (status = 403, description = "Admin role required", body = MessageResponse),
        (status = 404, description = "User not found", body = MessageResponse)
    )
)]
pub async fn update_user(
    identity: AuthenticatedIdentity,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = user_id(path)?;
    let request = payload(body)?;

    let user = state.db.update_user(id, request.into())?;

    info!("{} updated user {}", identity.subject, id);

    Ok(Json(user.into()))
}

/// DELETE /api/v1/users/{id} (Admin only)
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Invalid user ID", body = MessageResponse),
        (status = 401, description = "Missing or invalid access token", body = MessageResponse),
        (status = 403, description = "Admin role required", body = MessageResponse),
        (status = 404, description = "User not found", body = MessageResponse)
    )
)]
pub async fn delete_user(
    identity: AuthenticatedIdentity,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = user_id(path)?;

    if !state.db.delete_user(id) {
        return Err(user_not_found());
    }

    info!("{} deleted user {}", identity.subject, id);

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

/// Create user routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let read = Router::new()
        .route("/api/v1/users", get(list_users))
        .route("/api/v1/users/{id}", get(get_user));

    let write = Router::new()
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/users/{id}", put(update_user).delete(delete_user))
        .route_layer(from_fn_with_state(Role::Admin, require_role));

    read.merge(write)
        .route_layer(from_fn_with_state(state.gate.clone(), require_auth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{bearer, test_state};
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        routes(&state).with_state(state)
    }

    async fn send(
        app: Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_list_requires_token() {
        let (status, body) = send(app(test_state()), "GET", "/api/v1/users", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Missing or malformed authorization header");
    }

    #[tokio::test]
    async fn test_list_with_user_token() {
        let state = test_state();
        let token = bearer(&state, "user@example.com", Role::User);

        let (status, body) = send(app(state), "GET", "/api/v1/users", Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 4);
        assert_eq!(body[0]["name"], "John Doe");
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_access_users() {
        let state = test_state();
        let pair = state.issuer.issue("admin@example.com", Role::Admin).unwrap();
        let token = format!("Bearer {}", pair.refresh_token);

        let (status, body) = send(app(state), "GET", "/api/v1/users", Some(&token), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_get_user() {
        let state = test_state();
        let token = bearer(&state, "user@example.com", Role::User);

        let (status, body) =
            send(app(state.clone()), "GET", "/api/v1/users/2", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Jane Smith");

        let (status, body) =
            send(app(state.clone()), "GET", "/api/v1/users/99", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");

        let (status, body) =
            send(app(state), "GET", "/api/v1/users/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid user ID");
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let state = test_state();
        let token = bearer(&state, "user@example.com", Role::User);
        let user = serde_json::json!({ "name": "Eve", "age": 22, "address": "1 Elm St" });

        let (status, body) =
            send(app(state.clone()), "POST", "/api/v1/users", Some(&token), Some(user)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Forbidden");
        assert_eq!(state.db.list_users().len(), 4);
    }

    #[tokio::test]
    async fn test_admin_creates_user() {
        let state = test_state();
        let token = bearer(&state, "admin@example.com", Role::Admin);
        let user = serde_json::json!({ "name": "Eve", "age": 22, "address": "1 Elm St" });

        let (status, body) =
            send(app(state.clone()), "POST", "/api/v1/users", Some(&token), Some(user)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 5);
        assert_eq!(body["name"], "Eve");
        assert!(state.db.get_user_by_id(5).is_some());
    }

    #[tokio::test]
    async fn test_create_validation() {
        let state = test_state();
        let token = bearer(&state, "admin@example.com", Role::Admin);

        let (status, body) = send(
            app(state.clone()),
            "POST",
            "/api/v1/users",
            Some(&token),
            Some(serde_json::json!({ "age": 22 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Name is required");

        let (status, body) = send(
            app(state),
            "POST",
            "/api/v1/users",
            Some(&token),
            Some(serde_json::json!({ "name": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request payload");
    }

    #[tokio::test]
    async fn test_admin_updates_user() {
        let state = test_state();
        let token = bearer(&state, "admin@example.com", Role::Admin);

        let (status, body) = send(
            app(state.clone()),
            "PUT",
            "/api/v1/users/1",
            Some(&token),
            Some(serde_json::json!({ "name": "John Q. Doe", "age": 0 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "John Q. Doe");
        assert_eq!(body["age"], 30);
        assert_eq!(body["address"], "123 Main St");

        let (status, body) = send(
            app(state),
            "PUT",
            "/api/v1/users/42",
            Some(&token),
            Some(serde_json::json!({ "name": "Nobody" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");
    }

    #[tokio::test]
    async fn test_delete_user() {
        let state = test_state();
        let admin = bearer(&state, "admin@example.com", Role::Admin);
        let user = bearer(&state, "user@example.com", Role::User);

        let (status, _) =
            send(app(state.clone()), "DELETE", "/api/v1/users/3", Some(&user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) =
            send(app(state.clone()), "DELETE", "/api/v1/users/3", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User deleted successfully");

        let (status, _) =
            send(app(state), "DELETE", "/api/v1/users/3", Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_list_is_not_found() {
        let state = test_state();
        for id in 1..=4 {
            state.db.delete_user(id);
        }
        let token = bearer(&state, "user@example.com", Role::User);

        let (status, body) = send(app(state), "GET", "/api/v1/users", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No users found");
    }
}
