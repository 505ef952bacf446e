//! Storage-specific error types for in-memory operations.

use thiserror::Error;
use walletquota_core::errors::{DatabaseError, Error};

/// Errors raised inside the storage layer.
///
/// Converted to `walletquota_core::Error` before being returned to callers.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    UniqueViolation(String),

    #[error("Constraint violated: {0}")]
    CheckViolation(String),
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        StorageError::LockPoisoned(err.to_string())
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::LockPoisoned(e) => Error::Database(DatabaseError::Internal(e)),
            StorageError::NotFound(e) => Error::Database(DatabaseError::NotFound(e)),
            StorageError::UniqueViolation(e) => {
                Error::Database(DatabaseError::UniqueViolation(e))
            }
            StorageError::CheckViolation(e) => Error::Database(DatabaseError::QueryFailed(e)),
        }
    }
}
