//! Store errors

use thiserror::Error;

/// Record store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record not found
    #[error("record not found")]
    NotFound,

    /// A record with the same primary email already exists
    #[error("duplicate primary email: {0}")]
    DuplicateEmail(String),

    /// Backend failure (connection, query, serialization)
    #[error("store error: {0}")]
    Backend(String),
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
