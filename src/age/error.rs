//! Age index error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or querying the age index
#[derive(Error, Debug)]
pub enum AgeError {
    /// The CSV source could not be opened or read
    #[error("Age source {path:?} unavailable: {error}")]
    SourceUnavailable { path: PathBuf, error: String },

    /// The identifier is not a structure ID (at least 10 digits, fits in u64)
    #[error("Invalid structure ID: {0}")]
    InvalidId(String),

    /// No usable rows have been loaded
    #[error("Age index not loaded")]
    NotLoaded,

    /// The index could not produce an estimate for this identifier
    #[error("Not estimable: {0}")]
    NotEstimable(u64),
}

/// Result type alias for age index operations
pub type AgeResult<T> = Result<T, AgeError>;
