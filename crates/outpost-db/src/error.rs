//! Database error types.

use outpost_core::{OutpostError, StoreError};
use thiserror::Error;

/// Database-specific errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to open or create the database file.
    #[error("failed to open database: {0}")]
    Open(String),

    /// Migration execution failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    Query(String),

    /// Requested record was not found.
    #[error("record not found")]
    NotFound,

    /// An outlet with the same name is already stored.
    #[error("outlet already stored: {name}")]
    Duplicate {
        /// Name that collided
        name: String,
    },

    /// The record failed validation before it reached the database.
    #[error("invalid outlet record: {0}")]
    Invalid(String),

    /// Failed to decode a stored value.
    #[error("decode error: {0}")]
    Decode(String),

    /// Underlying `SQLx` error.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error during database operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Duplicate { name } => Self::Duplicate { name },
            DatabaseError::Invalid(reason) => Self::Invalid(reason),
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<DatabaseError> for OutpostError {
    fn from(err: DatabaseError) -> Self {
        Self::Database(err.to_string())
    }
}
