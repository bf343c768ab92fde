//! In-memory user repository

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::DbError;
use crate::models::{NewUser, User, UserUpdate, sample_users};

#[derive(Debug)]
struct UserTable {
    rows: BTreeMap<i64, User>,
    next_id: i64,
}

impl Default for UserTable {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// Shared handle to the user table
#[derive(Debug, Clone, Default)]
pub struct Database {
    users: Arc<RwLock<UserTable>>,
}

impl Database {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the demo users, returning how many were added
    pub fn seed_sample_users(&self) -> Result<usize, DbError> {
        let samples = sample_users();
        let count = samples.len();
        for user in samples {
            self.insert_user(user)?;
        }
        info!("Seeded {} sample users", count);
        Ok(count)
    }

    // ==================== User Operations ====================

    /// Insert a new user; the id is assigned by the store
    pub fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        user.validate()?;

        let mut table = self.users.write();
        let id = table.next_id;
        table.next_id += 1;

        let user = User {
            id,
            name: user.name,
            age: user.age,
            address: user.address,
        };
        table.rows.insert(id, user.clone());

        debug!("Inserted user {}", id);
        Ok(user)
    }

    /// Get a user by ID
    pub fn get_user_by_id(&self, id: i64) -> Option<User> {
        self.users.read().rows.get(&id).cloned()
    }

    /// List all users ordered by id
    pub fn list_users(&self) -> Vec<User> {
        self.users.read().rows.values().cloned().collect()
    }

    /// Apply an update to an existing user
    pub fn update_user(&self, id: i64, update: UserUpdate) -> Result<User, DbError> {
        update.validate()?;

        let mut table = self.users.write();
        let user = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| DbError::NotFound("User not found".to_string()))?;
        update.apply(user);

        debug!("Updated user {}", id);
        Ok(user.clone())
    }

    /// Delete a user
    pub fn delete_user(&self, id: i64) -> bool {
        self.users.write().rows.remove(&id).is_some()
    }

    /// Check if any users exist
    pub fn has_users(&self) -> bool {
        !self.users.read().rows.is_empty()
    }
}
