//! Database models

use serde::{Deserialize, Serialize};

use crate::error::DbError;

/// User model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub address: String,
}

/// New user (for insertion)
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub age: u32,
    pub address: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), DbError> {
        validate_name(&self.name)
    }
}

/// Changes applied to an existing user.
///
/// `name` is always replaced; `age` only when non-zero and `address` only
/// when non-empty.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: String,
    pub age: Option<u32>,
    pub address: Option<String>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), DbError> {
        validate_name(&self.name)
    }

    pub(crate) fn apply(self, user: &mut User) {
        user.name = self.name;
        if let Some(age) = self.age.filter(|age| *age != 0) {
            user.age = age;
        }
        if let Some(address) = self.address.filter(|address| !address.is_empty()) {
            user.address = address;
        }
    }
}

fn validate_name(name: &str) -> Result<(), DbError> {
    if name.trim().is_empty() {
        return Err(DbError::Invalid("Name is required".to_string()));
    }
    Ok(())
}

/// Demo records loaded at startup when seeding is enabled
pub fn sample_users() -> Vec<NewUser> {
    [
        ("John Doe", 30, "123 Main St"),
        ("Jane Smith", 25, "456 Elm St"),
        ("Alice Johnson", 28, "789 Oak St"),
        ("Bob Brown", 35, "101 Pine St"),
    ]
    .into_iter()
    .map(|(name, age, address)| NewUser {
        name: name.to_string(),
        age,
        address: address.to_string(),
    })
    .collect()
}
