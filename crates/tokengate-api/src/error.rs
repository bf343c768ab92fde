//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] tokengate_db::DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] tokengate_auth::AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Database(e) => match e {
                tokengate_db::DbError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                tokengate_db::DbError::Invalid(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            },
            ApiError::Auth(e) => {
                if e.status().is_server_error() {
                    error!("Auth failure: {}", e);
                }
                (e.status(), e.public_message().to_string())
            }
        };

        let body = axum::Json(json!({
            "message": message
        }));

        (status, body).into_response()
    }
}
