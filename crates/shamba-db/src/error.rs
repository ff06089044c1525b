//! Database error types

use thiserror::Error;

/// Database operation errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stored row no longer satisfies the domain rules
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl DbError {
    /// Map a unique-violation on `constraint` to `Duplicate`, everything
    /// else to `Query`.
    pub(crate) fn from_insert(e: sqlx::Error, constraint: &str, what: impl FnOnce() -> String) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.constraint() == Some(constraint) {
                return DbError::Duplicate(what());
            }
        }
        DbError::Query(e)
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
