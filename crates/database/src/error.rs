//! Database error types.

use thiserror::Error;
use webhook_core::StoreError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Record already exists. For conversations this is the duplicate-key
    /// signal the upsert engine recovers from.
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Narrow a database error to the surface the processing core sees.
impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::AlreadyExists { key, .. } => StoreError::AlreadyExists(key),
            other => StoreError::Storage(other.to_string()),
        }
    }
}
