//! Error types for the sync engine.

use crate::orchestrator::TaskFailure;
use mastersync_codec::DecodeError;
use mastersync_core::CoreError;
use mastersync_protocol::ProtocolError;
use mastersync_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while syncing one category or unit.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("network error: {message}")]
    Network {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The authority is not reachable.
    #[error("no network connection")]
    NoNetwork,

    /// A payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Shape resolution or record building failed.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// A storage port failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// No storage port is registered for a category.
    #[error("no store registered for category '{category}'")]
    MissingStore {
        /// The category without a store.
        category: String,
    },

    /// The authority returned no identity schema.
    #[error("identity schema not available from the authority")]
    SchemaUnavailable,

    /// A response signature is missing or wrong.
    #[error("response signature invalid: {0}")]
    SignatureInvalid(String),

    /// A wire document could not be read.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A unit panicked instead of returning a result.
    #[error("sync unit '{group}' panicked: {message}")]
    TaskPanicked {
        /// Logical group of the unit.
        group: String,
        /// Panic message, if it was a string.
        message: String,
    },
}

impl SyncError {
    /// Creates a retryable network error.
    pub fn network_retryable(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable network error.
    pub fn network_fatal(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a missing store error.
    pub fn missing_store(category: impl Into<String>) -> Self {
        Self::MissingStore {
            category: category.into(),
        }
    }

    /// Returns true if this error can be retried by the caller.
    ///
    /// The orchestrator never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network { retryable, .. } => *retryable,
            SyncError::NoNetwork => true,
            _ => false,
        }
    }
}

/// The whole-batch failure surfaced to callers of
/// [`SyncVerdict::into_result`](crate::SyncVerdict::into_result).
#[derive(Error, Debug)]
#[error("{} ({} failed unit(s)): {}", Self::CODE, .causes.len(), summarize(.causes))]
pub struct MasterSyncFailed {
    /// Failures in plan order.
    pub causes: Vec<TaskFailure>,
}

impl MasterSyncFailed {
    /// Error code reported to the caller that triggered the sync.
    pub const CODE: &'static str = "MASTER_SYNC_EXCEPTION";
}

fn summarize(causes: &[TaskFailure]) -> String {
    causes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
