//! Identity schema and process specification storage.

use crate::dir::StoreDir;
use crate::error::StorageResult;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

const SCHEMA_FILE: &str = "schema.json";

/// Persists identity schemas and the process specs that ship with them.
///
/// Documents are versioned by the schema's `idVersion`. Writing the same
/// version again replaces the stored document.
pub trait SchemaStore: Send + Sync {
    /// Stores an identity schema document.
    fn create_identity_schema(&self, id_version: f64, document: &Value) -> StorageResult<()>;

    /// Stores one process specification under its key.
    fn create_process_spec(&self, key: &str, id_version: f64, spec: &Value) -> StorageResult<()>;

    /// Returns the identity schema with the highest version.
    fn latest_identity_schema(&self) -> StorageResult<Option<(f64, Value)>>;

    /// Returns a process specification.
    fn process_spec(&self, key: &str, id_version: f64) -> StorageResult<Option<Value>>;
}

/// Version rendered as a map key. `1.0` and `1` collapse to the same key.
fn version_key(id_version: f64) -> String {
    format!("{id_version:.3}")
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaDocuments {
    identity_schemas: BTreeMap<String, VersionedDocument>,
    process_specs: BTreeMap<String, BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionedDocument {
    id_version: f64,
    document: Value,
}

impl SchemaDocuments {
    fn put_identity(&mut self, id_version: f64, document: &Value) {
        self.identity_schemas.insert(
            version_key(id_version),
            VersionedDocument {
                id_version,
                document: document.clone(),
            },
        );
    }

    fn put_process(&mut self, key: &str, id_version: f64, spec: &Value) {
        self.process_specs
            .entry(key.to_string())
            .or_default()
            .insert(version_key(id_version), spec.clone());
    }

    fn latest(&self) -> Option<(f64, Value)> {
        self.identity_schemas
            .values()
            .max_by(|a, b| a.id_version.total_cmp(&b.id_version))
            .map(|d| (d.id_version, d.document.clone()))
    }

    fn process(&self, key: &str, id_version: f64) -> Option<Value> {
        self.process_specs
            .get(key)
            .and_then(|versions| versions.get(&version_key(id_version)))
            .cloned()
    }
}

/// In-memory schema store.
#[derive(Debug, Default)]
pub struct MemorySchemaStore {
    data: RwLock<SchemaDocuments>,
}

impl MemorySchemaStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identity schema versions.
    #[must_use]
    pub fn identity_schema_count(&self) -> usize {
        self.data.read().identity_schemas.len()
    }

    /// Number of stored process specs across all keys and versions.
    #[must_use]
    pub fn process_spec_count(&self) -> usize {
        self.data
            .read()
            .process_specs
            .values()
            .map(BTreeMap::len)
            .sum()
    }
}

impl SchemaStore for MemorySchemaStore {
    fn create_identity_schema(&self, id_version: f64, document: &Value) -> StorageResult<()> {
        self.data.write().put_identity(id_version, document);
        Ok(())
    }

    fn create_process_spec(&self, key: &str, id_version: f64, spec: &Value) -> StorageResult<()> {
        self.data.write().put_process(key, id_version, spec);
        Ok(())
    }

    fn latest_identity_schema(&self) -> StorageResult<Option<(f64, Value)>> {
        Ok(self.data.read().latest())
    }

    fn process_spec(&self, key: &str, id_version: f64) -> StorageResult<Option<Value>> {
        Ok(self.data.read().process(key, id_version))
    }
}

/// Schema store persisted as `schema.json` in a store directory.
#[derive(Debug)]
pub struct FileSchemaStore {
    path: PathBuf,
    dir: Arc<StoreDir>,
    data: RwLock<SchemaDocuments>,
}

impl FileSchemaStore {
    /// Opens the schema file of a store directory, loading it if present.
    pub fn open(dir: Arc<StoreDir>) -> StorageResult<Self> {
        let path = dir.path().join(SCHEMA_FILE);
        let data = match dir.read(&path)? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => SchemaDocuments::default(),
        };
        Ok(Self {
            path,
            dir,
            data: RwLock::new(data),
        })
    }

    fn mutate(&self, f: impl FnOnce(&mut SchemaDocuments)) -> StorageResult<()> {
        let mut guard = self.data.write();
        let mut next = guard.clone();
        f(&mut next);
        self.dir
            .write_atomic(&self.path, &serde_json::to_vec_pretty(&next)?)?;
        *guard = next;
        Ok(())
    }
}

impl SchemaStore for FileSchemaStore {
    fn create_identity_schema(&self, id_version: f64, document: &Value) -> StorageResult<()> {
        self.mutate(|data| data.put_identity(id_version, document))
    }

    fn create_process_spec(&self, key: &str, id_version: f64, spec: &Value) -> StorageResult<()> {
        self.mutate(|data| data.put_process(key, id_version, spec))
    }

    fn latest_identity_schema(&self) -> StorageResult<Option<(f64, Value)>> {
        Ok(self.data.read().latest())
    }

    fn process_spec(&self, key: &str, id_version: f64) -> StorageResult<Option<Value>> {
        Ok(self.data.read().process(key, id_version))
    }
}
