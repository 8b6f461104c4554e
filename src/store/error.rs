//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during inventory operations.
///
/// Every variant means the same thing to callers: the store could not
/// complete the operation. Producers retry on their next cycle; the API
/// reports a server error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store cannot serve requests (poisoned lock, lost worker task).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
