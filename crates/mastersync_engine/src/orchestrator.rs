//! Concurrent fan-out of sync units and verdict aggregation.

use crate::config::{GroupKind, LogicalGroup, SyncConfig};
use crate::error::{MasterSyncFailed, SyncError, SyncResult};
use crate::schema::SchemaSync;
use crate::task::{CategorySyncTask, DynamicFieldSyncTask, TaskResult, TaskState};
use crate::transport::SyncTransport;
use mastersync_codec::{CryptoPort, PayloadCodec};
use mastersync_core::CategoryRegistry;
use mastersync_protocol::{BatchRequest, SyncBatch};
use mastersync_storage::{SchemaStore, StoreSet};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// One failed unit of a round.
#[derive(Debug)]
pub struct TaskFailure {
    /// Logical group of the unit.
    pub group: String,
    /// Category the unit stopped at.
    pub category: String,
    /// The failure.
    pub cause: SyncError,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.group, self.category, self.cause)
    }
}

/// The single outcome of a round.
#[derive(Debug)]
pub enum SyncVerdict {
    /// Every unit completed.
    Success,
    /// At least one unit failed; causes are in plan order.
    Failure {
        /// Failed units.
        causes: Vec<TaskFailure>,
    },
}

impl SyncVerdict {
    /// Returns true for [`SyncVerdict::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, SyncVerdict::Success)
    }

    /// Failed units, empty on success.
    pub fn causes(&self) -> &[TaskFailure] {
        match self {
            SyncVerdict::Success => &[],
            SyncVerdict::Failure { causes } => causes,
        }
    }

    /// Converts the verdict into the error surfaced to the caller.
    pub fn into_result(self) -> Result<(), MasterSyncFailed> {
        match self {
            SyncVerdict::Success => Ok(()),
            SyncVerdict::Failure { causes } => Err(MasterSyncFailed { causes }),
        }
    }
}

/// Per-group outcome within a [`RoundReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    /// Group name.
    pub group: String,
    /// Final state.
    pub state: TaskState,
    /// Entities (or schema documents) written.
    pub entities: usize,
}

/// Everything observed during one round.
#[derive(Debug)]
pub struct RoundReport {
    /// Round id, also recorded on the `master_sync` span.
    pub round_id: Uuid,
    /// Wall-clock time of the round.
    pub elapsed: Duration,
    /// Group outcomes in plan order.
    pub groups: Vec<GroupReport>,
    /// The verdict.
    pub verdict: SyncVerdict,
}

/// Counters across rounds.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Rounds that ended in success.
    pub rounds_succeeded: u64,
    /// Rounds that ended in failure.
    pub rounds_failed: u64,
    /// Entities written across all rounds.
    pub entities_written: u64,
    /// Id of the last round.
    pub last_round_id: Option<Uuid>,
    /// Duration of the last round.
    pub last_elapsed: Option<Duration>,
}

/// Runs every logical group of the plan concurrently against one batch.
///
/// Each group runs on its own scoped thread. The orchestrator waits for all
/// of them, never cancels on failure and never retries.
pub struct SyncOrchestrator {
    config: SyncConfig,
    codec: PayloadCodec,
    registry: Arc<CategoryRegistry>,
    stores: StoreSet,
    schema_store: Arc<dyn SchemaStore>,
    transport: Arc<dyn SyncTransport>,
    states: RwLock<Vec<(String, TaskState)>>,
    stats: RwLock<SyncStats>,
}

impl SyncOrchestrator {
    /// Creates an orchestrator over the standard category registry.
    pub fn new(
        config: SyncConfig,
        crypto: Arc<dyn CryptoPort>,
        stores: StoreSet,
        schema_store: Arc<dyn SchemaStore>,
        transport: Arc<dyn SyncTransport>,
    ) -> Self {
        let states = pending_states(config.plan.groups());
        Self {
            config,
            codec: PayloadCodec::new(crypto),
            registry: CategoryRegistry::standard(),
            stores,
            schema_store,
            transport,
            states: RwLock::new(states),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Replaces the category registry.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<CategoryRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the store set.
    pub fn stores(&self) -> &StoreSet {
        &self.stores
    }

    /// State of every group of the current or last round, in plan order.
    pub fn group_states(&self) -> Vec<(String, TaskState)> {
        self.states.read().clone()
    }

    /// Counters across rounds.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Syncs a batch and returns the verdict.
    pub fn sync_all(&self, batch: &SyncBatch) -> SyncVerdict {
        self.run_round(batch).verdict
    }

    /// Fetches a batch through the transport, then syncs it.
    ///
    /// A failed fetch is returned as is; nothing is written in that case.
    pub fn fetch_and_sync(&self, request: &BatchRequest) -> SyncResult<SyncVerdict> {
        let batch = self.transport.fetch(request).map_err(|e| {
            tracing::error!(key_index = %request.key_index, error = %e, "batch fetch failed");
            e
        })?;
        Ok(self.sync_all(&batch))
    }

    /// Runs only schema sync with the configured trigger point.
    pub fn sync_schema(&self) -> TaskResult {
        SchemaSync::new(self.transport.as_ref(), self.schema_store.as_ref())
            .run(&self.config.schema_trigger_point)
    }

    /// Syncs a batch and returns the full round report.
    pub fn run_round(&self, batch: &SyncBatch) -> RoundReport {
        let round_id = Uuid::new_v4();
        let groups = self.config.plan.groups();
        let span = tracing::info_span!("master_sync", round = %round_id, groups = groups.len());
        let _entered = span.enter();

        let started = Instant::now();
        *self.states.write() = pending_states(groups);
        tracing::info!(
            datasets = batch.entries.len(),
            last_sync_time = batch.last_sync_time.as_deref().unwrap_or(""),
            "master sync started"
        );
        for shadowed in batch.shadowed() {
            tracing::warn!(
                category = %shadowed.category_name,
                "duplicate dataset ignored, first occurrence wins"
            );
        }

        let results: Vec<TaskResult> = std::thread::scope(|scope| {
            let handles: Vec<_> = groups
                .iter()
                .enumerate()
                .map(|(index, group)| {
                    let parent = span.clone();
                    scope.spawn(move || {
                        let _group_span =
                            tracing::info_span!(parent: &parent, "group", group = %group.name)
                                .entered();
                        self.set_state(index, TaskState::Running);
                        let result = self.run_group(group, batch);
                        self.set_state(index, final_state(&result));
                        result
                    })
                })
                .collect();

            handles
                .into_iter()
                .zip(groups)
                .enumerate()
                .map(|(index, (handle, group))| {
                    handle.join().unwrap_or_else(|payload| {
                        let message = panic_message(payload.as_ref());
                        tracing::error!(group = %group.name, panic = %message, "sync unit panicked");
                        self.set_state(index, TaskState::Failed);
                        TaskResult::Failed {
                            category: group.name.clone(),
                            cause: SyncError::TaskPanicked {
                                group: group.name.clone(),
                                message,
                            },
                        }
                    })
                })
                .collect()
        });

        let mut reports = Vec::with_capacity(groups.len());
        let mut causes = Vec::new();
        let mut entities_written = 0usize;
        for (group, result) in groups.iter().zip(results) {
            let state = final_state(&result);
            let entities = match result {
                TaskResult::Completed { entities } => entities,
                TaskResult::Failed { category, cause } => {
                    causes.push(TaskFailure {
                        group: group.name.clone(),
                        category,
                        cause,
                    });
                    0
                }
            };
            entities_written += entities;
            reports.push(GroupReport {
                group: group.name.clone(),
                state,
                entities,
            });
        }

        let elapsed = started.elapsed();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let verdict = if causes.is_empty() {
            tracing::info!(elapsed_ms, entities = entities_written, "master sync succeeded");
            SyncVerdict::Success
        } else {
            tracing::error!(
                elapsed_ms,
                failed = causes.len(),
                entities = entities_written,
                "master sync failed"
            );
            SyncVerdict::Failure { causes }
        };

        {
            let mut stats = self.stats.write();
            if verdict.is_success() {
                stats.rounds_succeeded += 1;
            } else {
                stats.rounds_failed += 1;
            }
            stats.entities_written += entities_written as u64;
            stats.last_round_id = Some(round_id);
            stats.last_elapsed = Some(elapsed);
        }

        RoundReport {
            round_id,
            elapsed,
            groups: reports,
            verdict,
        }
    }

    fn run_group(&self, group: &LogicalGroup, batch: &SyncBatch) -> TaskResult {
        match &group.kind {
            GroupKind::Fixed(categories) => {
                CategorySyncTask::new(&group.name, &self.codec, &self.registry, &self.stores)
                    .run(batch, categories)
            }
            GroupKind::Dynamic => DynamicFieldSyncTask::new(&group.name, &self.codec, &self.stores)
                .with_duplicate_resolution(self.config.resolve_dynamic_duplicates)
                .run(batch),
            GroupKind::Schema => self.sync_schema(),
        }
    }

    fn set_state(&self, index: usize, state: TaskState) {
        if let Some(slot) = self.states.write().get_mut(index) {
            slot.1 = state;
        }
    }
}

impl fmt::Debug for SyncOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("config", &self.config)
            .field("stores", &self.stores)
            .finish_non_exhaustive()
    }
}

fn pending_states(groups: &[LogicalGroup]) -> Vec<(String, TaskState)> {
    groups
        .iter()
        .map(|g| (g.name.clone(), TaskState::Pending))
        .collect()
}

fn final_state(result: &TaskResult) -> TaskState {
    if result.is_completed() {
        TaskState::Completed
    } else {
        TaskState::Failed
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
