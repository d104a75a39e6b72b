//! Response envelope shared by every authority endpoint.

use crate::error::{ProtocolError, ProtocolResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One error entry of a response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    /// Authority error code, e.g. `KER-SNC-149`.
    pub error_code: String,
    /// Human readable message.
    pub message: String,
}

impl ServiceError {
    /// Creates a service error.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_code, self.message)
    }
}

/// `{ "response": T?, "errors": [...] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope<T> {
    /// Endpoint id echoed by the authority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// API version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Server time of the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsetime: Option<String>,
    /// The payload, absent on error.
    pub response: Option<T>,
    /// Errors; `null` and missing both mean none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<ServiceError>,
}

impl<T> ResponseEnvelope<T> {
    /// Wraps a successful response.
    pub fn ok(response: T) -> Self {
        Self {
            id: None,
            version: None,
            responsetime: None,
            response: Some(response),
            errors: Vec::new(),
        }
    }

    /// Wraps a list of errors.
    pub fn failed(errors: Vec<ServiceError>) -> Self {
        Self {
            id: None,
            version: None,
            responsetime: None,
            response: None,
            errors,
        }
    }

    /// Returns the response, or the listed errors if there are any.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Service`] when the envelope lists errors,
    /// even if a response is also present.
    pub fn into_response(self) -> ProtocolResult<Option<T>> {
        if self.errors.is_empty() {
            Ok(self.response)
        } else {
            Err(ProtocolError::Service {
                errors: self.errors,
            })
        }
    }
}

impl<T: DeserializeOwned> ResponseEnvelope<T> {
    /// Parses an envelope from a response body.
    pub fn from_slice(body: &[u8]) -> ProtocolResult<Self> {
        serde_json::from_slice(body).map_err(|e| ProtocolError::json("response envelope", e))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ServiceError>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ServiceError>>::deserialize(deserializer)?.unwrap_or_default())
}
