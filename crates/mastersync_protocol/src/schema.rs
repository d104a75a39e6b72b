//! Identity schema and process specification documents.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Suffix marking a top-level schema key as a process specification.
pub const PROCESS_KEY_SUFFIX: &str = "process";

/// The identity schema returned by the schema endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySchema {
    /// Schema id.
    #[serde(default)]
    pub id: Option<String>,
    /// Schema version; stored documents are keyed by it.
    pub id_version: f64,
    /// Field definitions.
    #[serde(default)]
    pub schema: Vec<Value>,
    /// JSON-schema rendering used for validation.
    #[serde(default)]
    pub schema_json: Option<String>,
    /// When the schema takes effect.
    #[serde(default)]
    pub effective_from: Option<String>,
    /// Remaining top-level keys, including process specifications.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IdentitySchema {
    /// Parses a schema document.
    pub fn from_value(value: Value) -> ProtocolResult<Self> {
        serde_json::from_value(value).map_err(|e| ProtocolError::json("identity schema", e))
    }

    /// Top-level entries whose key ends in `process`, ignoring case.
    pub fn process_entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.extra
            .iter()
            .filter(|(key, _)| is_process_key(key))
            .map(|(key, value)| (key.as_str(), value))
    }
}

fn is_process_key(key: &str) -> bool {
    key.len() >= PROCESS_KEY_SUFFIX.len()
        && key.as_bytes()[key.len() - PROCESS_KEY_SUFFIX.len()..]
            .eq_ignore_ascii_case(PROCESS_KEY_SUFFIX.as_bytes())
}

/// A registration process specification (screens and flow).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSpec {
    /// Process id, e.g. `NEW`.
    pub id: String,
    /// Display order.
    #[serde(default)]
    pub order: Option<i64>,
    /// Flow name.
    #[serde(default)]
    pub flow: Option<String>,
    /// Whether the process is offered.
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Labels by language.
    #[serde(default)]
    pub label: Map<String, Value>,
    /// Screen definitions.
    #[serde(default)]
    pub screens: Vec<Value>,
    /// Everything else, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProcessSpec {
    /// Parses a process specification.
    pub fn from_value(value: &Value) -> ProtocolResult<Self> {
        Self::deserialize(value).map_err(|e| ProtocolError::json("process spec", e))
    }
}
