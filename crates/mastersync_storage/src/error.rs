//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A table or schema file could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Another process holds the store directory.
    #[error("store directory is locked by another process: {}", path.display())]
    Locked {
        /// Directory that is locked.
        path: PathBuf,
    },

    /// A write would break a table invariant.
    #[error("constraint violation: {0}")]
    Constraint(String),
}

impl StorageError {
    /// Creates a constraint violation.
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint(message.into())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
