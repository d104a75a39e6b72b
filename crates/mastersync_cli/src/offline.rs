//! Transport over files on disk.

use mastersync_engine::{SyncError, SyncResult, SyncTransport};
use mastersync_protocol::{BatchRequest, ProtocolError, ResponseEnvelope, SyncBatch};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Serves a batch file and an optional schema file.
///
/// The authority counts as reachable only when a schema file was given, so
/// schema sync fails with "no network" otherwise. Both files may be bare
/// documents or wrapped in a response envelope.
#[derive(Debug, Clone)]
pub struct OfflineTransport {
    batch: PathBuf,
    schema: Option<PathBuf>,
}

impl OfflineTransport {
    /// Creates the transport.
    pub fn new(batch: impl Into<PathBuf>, schema: Option<PathBuf>) -> Self {
        Self {
            batch: batch.into(),
            schema,
        }
    }
}

fn read(path: &Path) -> SyncResult<Vec<u8>> {
    fs::read(path).map_err(|e| SyncError::network_fatal(format!("{}: {e}", path.display())))
}

fn unwrap_envelope(value: Value) -> SyncResult<Option<Value>> {
    let enveloped = value
        .as_object()
        .is_some_and(|o| o.contains_key("response") || o.contains_key("errors"));
    if !enveloped {
        return Ok(Some(value));
    }
    let envelope: ResponseEnvelope<Value> =
        serde_json::from_value(value).map_err(|e| ProtocolError::json("response envelope", e))?;
    Ok(envelope.into_response()?)
}

impl SyncTransport for OfflineTransport {
    fn fetch(&self, _request: &BatchRequest) -> SyncResult<SyncBatch> {
        let bytes = read(&self.batch)?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ProtocolError::json("sync batch", e))?;
        let body = unwrap_envelope(value)?
            .ok_or_else(|| SyncError::network_fatal("batch file has an empty response"))?;
        serde_json::from_value(body).map_err(|e| ProtocolError::json("sync batch", e).into())
    }

    fn fetch_schema(&self, _trigger_point: &str) -> SyncResult<Option<Value>> {
        let Some(path) = &self.schema else {
            return Err(SyncError::NoNetwork);
        };
        let bytes = read(path)?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ProtocolError::json("identity schema", e))?;
        unwrap_envelope(value)
    }

    fn is_reachable(&self) -> bool {
        self.schema.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_bare_and_enveloped_batches() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("bare.json");
        fs::write(
            &bare,
            json!({"dataToSync": [{"entityName": "Language", "entityType": "structured-data"}]})
                .to_string(),
        )
        .unwrap();
        let wrapped = dir.path().join("wrapped.json");
        fs::write(
            &wrapped,
            json!({"response": {"dataToSync": [], "lastSyncTime": "2024-01-01"}, "errors": null})
                .to_string(),
        )
        .unwrap();

        let batch = OfflineTransport::new(&bare, None)
            .fetch(&BatchRequest::new("offline"))
            .unwrap();
        assert_eq!(batch.entries.len(), 1);

        let batch = OfflineTransport::new(&wrapped, None)
            .fetch(&BatchRequest::new("offline"))
            .unwrap();
        assert_eq!(batch.last_sync_time.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn schema_requires_file() {
        let transport = OfflineTransport::new("missing.json", None);
        assert!(!transport.is_reachable());
        assert!(matches!(
            transport.fetch_schema("System"),
            Err(SyncError::NoNetwork)
        ));
        assert!(transport.fetch(&BatchRequest::new("offline")).is_err());
    }
}
