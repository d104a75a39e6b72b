//! CLI error type.

use mastersync_codec::DecodeError;
use mastersync_engine::{MasterSyncFailed, SyncError};
use mastersync_protocol::ProtocolError;
use mastersync_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    /// Reading or writing a file failed.
    #[error("{path}: {source}")]
    File {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// Key arguments are missing or unusable.
    #[error("invalid key: {0}")]
    Key(String),

    /// An input document is not what the command expects.
    #[error("invalid input: {0}")]
    Input(String),

    /// Records could not be sealed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A wire document could not be read or written.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A store could not be opened or read.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The batch could not be loaded.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The round finished with failed units.
    #[error(transparent)]
    Failed(#[from] MasterSyncFailed),
}

impl CliError {
    /// Wraps an I/O error with the path it concerns.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}
