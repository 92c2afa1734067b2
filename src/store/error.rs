//! Store error types

use thiserror::Error;

/// Errors that can occur in the systems store
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite rejected the statement or could not open the file
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// J-code is not `J` followed by six digits
    #[error("Invalid J-code: {0}")]
    InvalidJCode(String),

    /// Connection mutex was poisoned by a panicking writer
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
