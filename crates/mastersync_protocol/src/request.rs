//! Batch requests.

use serde::{Deserialize, Serialize};

/// Path of the client-settings endpoint, relative to the authority base URL.
pub const CLIENT_SETTINGS_PATH: &str = "/v1/syncdata/clientsettings";

/// Path of the identity schema endpoint.
pub const SCHEMA_PATH: &str = "/v1/syncdata/latestidschema";

/// Parameters of one master-data fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    /// Key index identifying this machine to the authority.
    pub key_index: String,
    /// `lastSyncTime` of the previous round; `None` requests a full batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Client version, used by the authority to pick compatible data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl BatchRequest {
    /// Creates a full-batch request for a machine.
    pub fn new(key_index: impl Into<String>) -> Self {
        Self {
            key_index: key_index.into(),
            last_updated: None,
            version: None,
        }
    }

    /// Requests only changes since the given server time.
    #[must_use]
    pub fn with_last_updated(mut self, last_updated: impl Into<String>) -> Self {
        self.last_updated = Some(last_updated.into());
        self
    }

    /// Sets the client version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Renders the request as a URL query string, without the leading `?`.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut pairs = vec![format!("keyindex={}", urlencoding::encode(&self.key_index))];
        if let Some(last_updated) = &self.last_updated {
            pairs.push(format!("lastupdated={}", urlencoding::encode(last_updated)));
        }
        if let Some(version) = &self.version {
            pairs.push(format!("version={}", urlencoding::encode(version)));
        }
        pairs.join("&")
    }

    /// Full client-settings URL under `base_url`.
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}{CLIENT_SETTINGS_PATH}?{}",
            base_url.trim_end_matches('/'),
            self.query_string()
        )
    }
}

/// Full schema URL under `base_url` for a trigger point.
#[must_use]
pub fn schema_url(base_url: &str, trigger_point: &str) -> String {
    format!(
        "{}{SCHEMA_PATH}?triggerpoint={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(trigger_point)
    )
}
