//! Storage errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Cannot decode column {column}: {reason}")]
    Decode { column: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Map driver errors, surfacing unique-constraint violations as [`StoreError::Duplicate`].
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate(db_err.message().to_string());
        }
    }
    StoreError::Sqlx(err)
}
