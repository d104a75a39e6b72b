//! Instrumented storage ports.
//!
//! [`RecordingStore`] counts calls and can fail on demand.
//! [`RendezvousStore`] and [`RendezvousSchemaStore`] block their first call
//! until every party of a shared [`Rendezvous`] has arrived, which only
//! happens when the parties run concurrently.

use mastersync_core::{Entity, EntityKey};
use mastersync_storage::{
    EntityStore, MemoryEntityStore, MemorySchemaStore, SchemaStore, StorageError, StorageResult,
    StoreSet,
};
use parking_lot::{Condvar, Mutex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long a rendezvous party waits for the others.
pub const RENDEZVOUS_TIMEOUT: Duration = Duration::from_secs(5);

/// An in-memory store that records every write.
#[derive(Debug)]
pub struct RecordingStore {
    inner: MemoryEntityStore,
    upsert_sizes: Mutex<Vec<usize>>,
    deleted: AtomicUsize,
    failure: Mutex<Option<String>>,
}

impl RecordingStore {
    /// Creates an empty recording store.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            inner: MemoryEntityStore::new(table),
            upsert_sizes: Mutex::new(Vec::new()),
            deleted: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    /// Makes every following `upsert_all` fail with a constraint error.
    pub fn fail_upserts(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    /// Number of `upsert_all` calls, failed ones included.
    pub fn upsert_calls(&self) -> usize {
        self.upsert_sizes.lock().len()
    }

    /// Entity count of every `upsert_all` call in order.
    pub fn upsert_sizes(&self) -> Vec<usize> {
        self.upsert_sizes.lock().clone()
    }

    /// Number of entities removed through `delete`.
    pub fn deleted(&self) -> usize {
        self.deleted.load(Ordering::SeqCst)
    }
}

impl EntityStore for RecordingStore {
    fn table(&self) -> &str {
        self.inner.table()
    }

    fn upsert_all(&self, entities: Vec<Entity>) -> StorageResult<usize> {
        self.upsert_sizes.lock().push(entities.len());
        if let Some(message) = self.failure.lock().clone() {
            return Err(StorageError::constraint(message));
        }
        self.inner.upsert_all(entities)
    }

    fn find_all_by_name(&self, name: &str) -> StorageResult<Vec<Entity>> {
        self.inner.find_all_by_name(name)
    }

    fn delete(&self, key: &EntityKey) -> StorageResult<bool> {
        let removed = self.inner.delete(key)?;
        if removed {
            self.deleted.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }

    fn get(&self, key: &EntityKey) -> StorageResult<Option<Entity>> {
        self.inner.get(key)
    }

    fn all(&self) -> StorageResult<Vec<Entity>> {
        self.inner.all()
    }

    fn len(&self) -> StorageResult<usize> {
        self.inner.len()
    }
}

/// Recording stores for a list of categories plus the set that serves them.
pub fn recording_set<'a>(
    categories: impl IntoIterator<Item = &'a str>,
) -> (StoreSet, BTreeMap<String, Arc<RecordingStore>>) {
    let mut set = StoreSet::new();
    let mut stores = BTreeMap::new();
    for category in categories {
        let store = Arc::new(RecordingStore::new(category));
        set.insert(category, store.clone());
        stores.insert(category.to_string(), store);
    }
    (set, stores)
}

/// A barrier with a timeout, counting how many parties arrived.
#[derive(Debug)]
pub struct Rendezvous {
    parties: usize,
    arrived: Mutex<usize>,
    all_arrived: Condvar,
}

impl Rendezvous {
    /// Creates a rendezvous for `parties` participants.
    pub fn new(parties: usize) -> Arc<Self> {
        Arc::new(Self {
            parties,
            arrived: Mutex::new(0),
            all_arrived: Condvar::new(),
        })
    }

    /// Arrives and waits for the others. Returns false on timeout.
    pub fn arrive(&self) -> bool {
        let mut arrived = self.arrived.lock();
        *arrived += 1;
        if *arrived >= self.parties {
            self.all_arrived.notify_all();
            return true;
        }
        let parties = self.parties;
        !self
            .all_arrived
            .wait_while_for(&mut arrived, |n| *n < parties, RENDEZVOUS_TIMEOUT)
            .timed_out()
    }

    /// Parties that have arrived so far.
    pub fn arrived(&self) -> usize {
        *self.arrived.lock()
    }

    /// Returns true once every party arrived.
    pub fn is_complete(&self) -> bool {
        self.arrived() >= self.parties
    }
}

/// Wraps a store; its first `upsert_all` waits at a rendezvous.
pub struct RendezvousStore {
    inner: Arc<dyn EntityStore>,
    rendezvous: Arc<Rendezvous>,
    arrived: AtomicBool,
    met: AtomicBool,
}

impl RendezvousStore {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn EntityStore>, rendezvous: Arc<Rendezvous>) -> Self {
        Self {
            inner,
            rendezvous,
            arrived: AtomicBool::new(false),
            met: AtomicBool::new(false),
        }
    }

    /// Returns true if the first call saw every other party arrive.
    pub fn met_everyone(&self) -> bool {
        self.met.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for RendezvousStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendezvousStore")
            .field("table", &self.inner.table())
            .field("met", &self.met)
            .finish_non_exhaustive()
    }
}

impl EntityStore for RendezvousStore {
    fn table(&self) -> &str {
        self.inner.table()
    }

    fn upsert_all(&self, entities: Vec<Entity>) -> StorageResult<usize> {
        if !self.arrived.swap(true, Ordering::SeqCst) {
            self.met.store(self.rendezvous.arrive(), Ordering::SeqCst);
        }
        self.inner.upsert_all(entities)
    }

    fn find_all_by_name(&self, name: &str) -> StorageResult<Vec<Entity>> {
        self.inner.find_all_by_name(name)
    }

    fn delete(&self, key: &EntityKey) -> StorageResult<bool> {
        self.inner.delete(key)
    }

    fn get(&self, key: &EntityKey) -> StorageResult<Option<Entity>> {
        self.inner.get(key)
    }

    fn all(&self) -> StorageResult<Vec<Entity>> {
        self.inner.all()
    }

    fn len(&self) -> StorageResult<usize> {
        self.inner.len()
    }
}

/// Wraps a schema store; its first `create_identity_schema` waits at a
/// rendezvous.
#[derive(Debug)]
pub struct RendezvousSchemaStore {
    inner: MemorySchemaStore,
    rendezvous: Arc<Rendezvous>,
    arrived: AtomicBool,
    met: AtomicBool,
}

impl RendezvousSchemaStore {
    /// Creates an in-memory schema store behind a rendezvous.
    pub fn new(rendezvous: Arc<Rendezvous>) -> Self {
        Self {
            inner: MemorySchemaStore::new(),
            rendezvous,
            arrived: AtomicBool::new(false),
            met: AtomicBool::new(false),
        }
    }

    /// Returns true if the first call saw every other party arrive.
    pub fn met_everyone(&self) -> bool {
        self.met.load(Ordering::SeqCst)
    }

    /// Stored identity schemas.
    pub fn identity_schema_count(&self) -> usize {
        self.inner.identity_schema_count()
    }
}

impl SchemaStore for RendezvousSchemaStore {
    fn create_identity_schema(&self, id_version: f64, document: &Value) -> StorageResult<()> {
        if !self.arrived.swap(true, Ordering::SeqCst) {
            self.met.store(self.rendezvous.arrive(), Ordering::SeqCst);
        }
        self.inner.create_identity_schema(id_version, document)
    }

    fn create_process_spec(&self, key: &str, id_version: f64, spec: &Value) -> StorageResult<()> {
        self.inner.create_process_spec(key, id_version, spec)
    }

    fn latest_identity_schema(&self) -> StorageResult<Option<(f64, Value)>> {
        self.inner.latest_identity_schema()
    }

    fn process_spec(&self, key: &str, id_version: f64) -> StorageResult<Option<Value>> {
        self.inner.process_spec(key, id_version)
    }
}

/// A store whose writes panic.
#[derive(Debug)]
pub struct PanickingStore {
    table: String,
}

impl PanickingStore {
    /// Creates the store.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

impl EntityStore for PanickingStore {
    fn table(&self) -> &str {
        &self.table
    }

    fn upsert_all(&self, _entities: Vec<Entity>) -> StorageResult<usize> {
        panic!("store '{}' exploded", self.table)
    }

    fn find_all_by_name(&self, _name: &str) -> StorageResult<Vec<Entity>> {
        Ok(Vec::new())
    }

    fn delete(&self, _key: &EntityKey) -> StorageResult<bool> {
        Ok(false)
    }

    fn get(&self, _key: &EntityKey) -> StorageResult<Option<Entity>> {
        Ok(None)
    }

    fn all(&self) -> StorageResult<Vec<Entity>> {
        Ok(Vec::new())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(0)
    }
}
