//! Identity schema sync.

use crate::error::{SyncError, SyncResult};
use crate::task::TaskResult;
use crate::transport::SyncTransport;
use mastersync_codec::DecodeError;
use mastersync_protocol::{IdentitySchema, ProcessSpec};
use mastersync_storage::SchemaStore;

/// Category reported for schema sync failures.
pub const SCHEMA_CATEGORY: &str = "IdentitySchema";

/// Fetches the latest identity schema and stores it with its process specs.
pub struct SchemaSync<'a> {
    transport: &'a dyn SyncTransport,
    schema_store: &'a dyn SchemaStore,
}

impl<'a> SchemaSync<'a> {
    /// Creates the unit.
    pub fn new(transport: &'a dyn SyncTransport, schema_store: &'a dyn SchemaStore) -> Self {
        Self {
            transport,
            schema_store,
        }
    }

    /// Runs schema sync for a trigger point.
    ///
    /// Reachability is checked first; an unreachable authority is reported
    /// as [`SyncError::NoNetwork`] without fetching or storing anything.
    pub fn run(&self, trigger_point: &str) -> TaskResult {
        match self.sync(trigger_point) {
            Ok(documents) => TaskResult::Completed {
                entities: documents,
            },
            Err(cause) => {
                tracing::warn!(trigger_point, error = %cause, "schema sync failed");
                TaskResult::Failed {
                    category: SCHEMA_CATEGORY.to_string(),
                    cause,
                }
            }
        }
    }

    fn sync(&self, trigger_point: &str) -> SyncResult<usize> {
        if !self.transport.is_reachable() {
            return Err(SyncError::NoNetwork);
        }

        let document = self
            .transport
            .fetch_schema(trigger_point)?
            .ok_or(SyncError::SchemaUnavailable)?;

        let schema = IdentitySchema::from_value(document.clone())
            .map_err(|e| DecodeError::malformed(e.to_string()))?;
        self.schema_store
            .create_identity_schema(schema.id_version, &document)?;

        let mut stored = 1;
        for (key, value) in schema.process_entries() {
            if let Err(e) = ProcessSpec::from_value(value) {
                tracing::warn!(key, error = %e, "skipping unreadable process spec");
                continue;
            }
            self.schema_store
                .create_process_spec(key, schema.id_version, value)?;
            stored += 1;
        }

        tracing::info!(
            trigger_point,
            id_version = schema.id_version,
            documents = stored,
            "identity schema synced"
        );
        Ok(stored)
    }
}

impl std::fmt::Debug for SchemaSync<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaSync").finish_non_exhaustive()
    }
}
