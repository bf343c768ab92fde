//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid record: {0}")]
    Invalid(String),
}
