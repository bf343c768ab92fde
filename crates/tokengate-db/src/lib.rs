//! Tokengate Data Layer
//!
//! In-memory store for the user records served by the CRUD API.

pub mod error;
pub mod models;
pub mod repository;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
