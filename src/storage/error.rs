//! Store Error Types

use std::io;
use thiserror::Error;

use crate::value::ValueError;

/// Document store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// No value stored under the key. The only failure a run tolerates.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored document contains something other than primitives, sequences and mappings
    #[error("Unsupported value: {0}")]
    Value(#[from] ValueError),

    /// Backend-specific failure
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
