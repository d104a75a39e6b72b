//! Transport port between the engine and the central authority.

use crate::error::{SyncError, SyncResult};
use mastersync_protocol::{BatchRequest, SyncBatch};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Fetches batches and schema documents from the authority.
///
/// Implementations only ever hand the engine payloads that already passed
/// response verification.
pub trait SyncTransport: Send + Sync {
    /// Fetches one sync batch.
    fn fetch(&self, request: &BatchRequest) -> SyncResult<SyncBatch>;

    /// Fetches the latest identity schema document, `None` if the authority
    /// has none.
    fn fetch_schema(&self, trigger_point: &str) -> SyncResult<Option<Value>>;

    /// Returns true if the authority can currently be reached.
    fn is_reachable(&self) -> bool;
}

/// A mock transport for testing.
///
/// Counts every call so tests can assert that nothing was fetched.
#[derive(Debug)]
pub struct MockTransport {
    reachable: AtomicBool,
    batch: Mutex<Option<SyncBatch>>,
    schema: Mutex<Option<Value>>,
    fetch_failure: Mutex<Option<String>>,
    last_trigger_point: Mutex<Option<String>>,
    fetch_calls: AtomicUsize,
    schema_calls: AtomicUsize,
}

impl MockTransport {
    /// Creates a reachable mock with nothing to serve.
    pub fn new() -> Self {
        Self {
            reachable: AtomicBool::new(true),
            batch: Mutex::new(None),
            schema: Mutex::new(None),
            fetch_failure: Mutex::new(None),
            last_trigger_point: Mutex::new(None),
            fetch_calls: AtomicUsize::new(0),
            schema_calls: AtomicUsize::new(0),
        }
    }

    /// Sets the batch returned by `fetch`.
    pub fn set_batch(&self, batch: SyncBatch) {
        *self.batch.lock() = Some(batch);
    }

    /// Sets the schema document returned by `fetch_schema`.
    pub fn set_schema(&self, schema: Value) {
        *self.schema.lock() = Some(schema);
    }

    /// Makes `fetch` fail with a retryable network error.
    pub fn fail_fetch(&self, message: impl Into<String>) {
        *self.fetch_failure.lock() = Some(message.into());
    }

    /// Sets reachability.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of `fetch` calls.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_schema` calls.
    pub fn schema_calls(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }

    /// Trigger point of the last `fetch_schema` call.
    pub fn last_trigger_point(&self) -> Option<String> {
        self.last_trigger_point.lock().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTransport for MockTransport {
    fn fetch(&self, _request: &BatchRequest) -> SyncResult<SyncBatch> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if !self.is_reachable() {
            return Err(SyncError::NoNetwork);
        }
        if let Some(message) = self.fetch_failure.lock().clone() {
            return Err(SyncError::network_retryable(message));
        }
        self.batch
            .lock()
            .clone()
            .ok_or_else(|| SyncError::network_fatal("no mock batch set"))
    }

    fn fetch_schema(&self, trigger_point: &str) -> SyncResult<Option<Value>> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_trigger_point.lock() = Some(trigger_point.to_string());
        if !self.is_reachable() {
            return Err(SyncError::NoNetwork);
        }
        Ok(self.schema.lock().clone())
    }

    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}
