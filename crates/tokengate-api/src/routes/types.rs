//! Request/Response DTOs

use serde::{Deserialize, Serialize};
use tokengate_db::{NewUser, User, UserUpdate};
use utoipa::ToSchema;

// ==================== Auth Types ====================

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh request
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ==================== User Types ====================

/// Create user request
#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub address: String,
}

impl From<CreateUserRequest> for NewUser {
    fn from(request: CreateUserRequest) -> Self {
        NewUser {
            name: request.name,
            age: request.age,
            address: request.address,
        }
    }
}

/// Update user request; a zero age or empty address leaves the field as is
#[derive(Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub address: Option<String>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(request: UpdateUserRequest) -> Self {
        UserUpdate {
            name: request.name,
            age: request.age,
            address: request.address,
        }
    }
}

/// User response
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub address: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            age: user.age,
            address: user.address,
        }
    }
}

// ==================== Common Types ====================

/// Plain message response, also the body of every error
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Health status response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
