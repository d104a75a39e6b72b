//! Per-group sync tasks.

use crate::config::DYNAMIC_FIELD_STORE;
use crate::error::{SyncError, SyncResult};
use mastersync_codec::PayloadCodec;
use mastersync_core::{CategoryRegistry, DynamicFieldRecord, Entity, EntityKey, RecordBuilder};
use mastersync_protocol::SyncBatch;
use mastersync_storage::StoreSet;
use std::collections::BTreeSet;

/// Outcome of one sync unit.
#[derive(Debug)]
pub enum TaskResult {
    /// Every category of the unit was written.
    Completed {
        /// Entities written across the unit.
        entities: usize,
    },
    /// The unit stopped at a failing category.
    Failed {
        /// Category that failed.
        category: String,
        /// The failure.
        cause: SyncError,
    },
}

impl TaskResult {
    /// Returns true for [`TaskResult::Completed`].
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskResult::Completed { .. })
    }

    fn failed(category: impl Into<String>, cause: impl Into<SyncError>) -> Self {
        TaskResult::Failed {
            category: category.into(),
            cause: cause.into(),
        }
    }
}

/// Lifecycle of one logical group within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Not started.
    Pending,
    /// Running on its thread.
    Running,
    /// Finished with [`TaskResult::Completed`].
    Completed,
    /// Finished with a failure or panic.
    Failed,
}

/// Syncs an ordered list of fixed categories.
///
/// Categories run strictly in order; the first failure stops the rest.
/// Writes of earlier categories are kept.
#[derive(Debug)]
pub struct CategorySyncTask<'a> {
    group: &'a str,
    codec: &'a PayloadCodec,
    registry: &'a CategoryRegistry,
    stores: &'a StoreSet,
}

impl<'a> CategorySyncTask<'a> {
    /// Creates a task for one logical group.
    pub fn new(
        group: &'a str,
        codec: &'a PayloadCodec,
        registry: &'a CategoryRegistry,
        stores: &'a StoreSet,
    ) -> Self {
        Self {
            group,
            codec,
            registry,
            stores,
        }
    }

    /// Runs the categories against a batch.
    pub fn run(&self, batch: &SyncBatch, categories: &[String]) -> TaskResult {
        let mut total = 0;
        for category in categories {
            match self.sync_category(batch, category) {
                Ok(written) => total += written,
                Err(cause) => {
                    tracing::warn!(
                        group = self.group,
                        category = %category,
                        error = %cause,
                        "category sync failed"
                    );
                    return TaskResult::failed(category.as_str(), cause);
                }
            }
        }
        TaskResult::Completed { entities: total }
    }

    fn sync_category(&self, batch: &SyncBatch, category: &str) -> SyncResult<usize> {
        let payload = batch
            .fixed_dataset(category)
            .and_then(|dataset| dataset.encrypted_payload.as_deref());

        let records = self.codec.decode(payload)?;
        let resolved = self.registry.resolve_shape(category)?;
        let entities = RecordBuilder::build_all(&records, resolved.shape)
            .map_err(mastersync_core::CoreError::from)?;

        let store = self
            .stores
            .get(category)
            .ok_or_else(|| SyncError::missing_store(category))?;

        let count = entities.len();
        store.upsert_all(entities)?;

        tracing::info!(
            group = self.group,
            category = category,
            shape = resolved.shape.name,
            tier = ?resolved.tier,
            entities = count,
            "category synced"
        );
        Ok(count)
    }
}

/// Syncs every dynamic dataset of a batch into the dynamic field store.
#[derive(Debug)]
pub struct DynamicFieldSyncTask<'a> {
    group: &'a str,
    codec: &'a PayloadCodec,
    stores: &'a StoreSet,
    resolve_duplicates: bool,
}

impl<'a> DynamicFieldSyncTask<'a> {
    /// Creates the task.
    pub fn new(group: &'a str, codec: &'a PayloadCodec, stores: &'a StoreSet) -> Self {
        Self {
            group,
            codec,
            stores,
            resolve_duplicates: true,
        }
    }

    /// Enables or disables deleting stored fields that share a name with
    /// incoming ones.
    #[must_use]
    pub fn with_duplicate_resolution(mut self, enabled: bool) -> Self {
        self.resolve_duplicates = enabled;
        self
    }

    /// Runs the task.
    pub fn run(&self, batch: &SyncBatch) -> TaskResult {
        let mut records: Vec<DynamicFieldRecord> = Vec::new();
        for dataset in batch.dynamic_datasets() {
            let decoded = match self.codec.decode(dataset.encrypted_payload.as_deref()) {
                Ok(decoded) => decoded,
                Err(e) => return TaskResult::failed(dataset.category_name.as_str(), e),
            };
            for record in &decoded {
                match RecordBuilder::build_dynamic(record) {
                    Ok(built) => records.push(built),
                    Err(e) => {
                        return TaskResult::failed(
                            dataset.category_name.as_str(),
                            mastersync_core::CoreError::from(e),
                        )
                    }
                }
            }
        }

        if records.is_empty() {
            tracing::debug!(group = self.group, "no dynamic fields in batch");
            return TaskResult::Completed { entities: 0 };
        }

        match self.write(records) {
            Ok(count) => TaskResult::Completed { entities: count },
            Err(cause) => {
                tracing::warn!(group = self.group, error = %cause, "dynamic field sync failed");
                TaskResult::failed(DYNAMIC_FIELD_STORE, cause)
            }
        }
    }

    fn write(&self, records: Vec<DynamicFieldRecord>) -> SyncResult<usize> {
        let store = self
            .stores
            .get(DYNAMIC_FIELD_STORE)
            .ok_or_else(|| SyncError::missing_store(DYNAMIC_FIELD_STORE))?;

        if self.resolve_duplicates {
            let names: BTreeSet<String> = records
                .iter()
                .filter_map(|r| r.name.as_deref())
                .map(str::to_lowercase)
                .collect();

            let mut stale: Vec<EntityKey> = Vec::new();
            for name in &names {
                stale.extend(store.find_all_by_name(name)?.into_iter().map(|e| e.key));
            }
            if !stale.is_empty() {
                let removed = store.delete_all(&stale)?;
                tracing::debug!(group = self.group, removed, "removed duplicate dynamic fields");
            }
        }

        let entities: Vec<Entity> = records
            .into_iter()
            .map(DynamicFieldRecord::into_entity)
            .collect();
        let count = entities.len();
        store.upsert_all(entities)?;

        tracing::info!(
            group = self.group,
            category = DYNAMIC_FIELD_STORE,
            entities = count,
            "dynamic fields synced"
        );
        Ok(count)
    }
}
