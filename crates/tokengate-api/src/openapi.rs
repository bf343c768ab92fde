//! OpenAPI document and Swagger UI
//!
//! - `/swagger` serves the interactive UI
//! - `/api-docs/openapi.json` serves the generated document
//!
//! New endpoints need `#[utoipa::path]` on the handler and an entry in
//! `paths(...)` below.

use axum::Router;
use tokengate_auth::{AuthenticatedIdentity, RefreshedToken, Role, TokenPair};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::routes::types::{
    CreateUserRequest, HealthResponse, LoginRequest, MessageResponse, RefreshRequest,
    UpdateUserRequest, UserResponse,
};

/// Tokengate API document
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tokengate API",
        description = "JWT access/refresh token service with a role-guarded user directory.\n\n\
            Protected endpoints expect `Authorization: Bearer <access token>`."
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "auth", description = "Login, token refresh and current identity"),
        (name = "users", description = "User directory; writes require the admin role"),
        (name = "health", description = "Liveness")
    ),
    components(
        schemas(
            LoginRequest,
            RefreshRequest,
            TokenPair,
            RefreshedToken,
            AuthenticatedIdentity,
            Role,
            CreateUserRequest,
            UpdateUserRequest,
            UserResponse,
            MessageResponse,
            HealthResponse,
        )
    ),
    paths(
        crate::routes::health::health,
        crate::routes::auth::login,
        crate::routes::auth::refresh,
        crate::routes::auth::me,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::create_user,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Swagger UI plus the JSON document
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
