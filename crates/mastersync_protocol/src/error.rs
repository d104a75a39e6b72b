//! Error types for the wire protocol.

use crate::envelope::ServiceError;
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding wire documents.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// A document is not valid JSON or does not match the expected layout.
    #[error("invalid {document}: {message}")]
    Json {
        /// Kind of document being read.
        document: &'static str,
        /// Parser message.
        message: String,
    },

    /// The authority answered with service errors instead of a response.
    #[error("service returned errors: {}", render(errors))]
    Service {
        /// Errors listed in the envelope.
        errors: Vec<ServiceError>,
    },
}

impl ProtocolError {
    /// Creates a JSON error for the given document kind.
    pub fn json(document: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Json {
            document,
            message: err.to_string(),
        }
    }
}

fn render(errors: &[ServiceError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
