//! In-memory entity store.

use crate::error::StorageResult;
use crate::store::{EntityStore, Table};
use mastersync_core::{Entity, EntityKey};
use parking_lot::RwLock;

/// An in-memory entity store.
///
/// Suitable for tests and for clients that reload master data on every
/// start. Thread-safe; share it behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use mastersync_core::{Entity, EntityKey};
/// use mastersync_storage::{EntityStore, MemoryEntityStore};
/// use std::collections::BTreeMap;
///
/// let store = MemoryEntityStore::new("Language");
/// let entity = Entity {
///     shape: "Language".to_string(),
///     key: EntityKey::new(["eng"]),
///     fields: BTreeMap::new(),
/// };
/// assert_eq!(store.upsert_all(vec![entity.clone(), entity]).unwrap(), 2);
/// assert_eq!(store.len().unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct MemoryEntityStore {
    table: String,
    data: RwLock<Table>,
}

impl MemoryEntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            data: RwLock::new(Table::default()),
        }
    }

    /// Creates a store pre-populated with entities.
    ///
    /// # Errors
    ///
    /// Fails if the entities do not share one shape.
    pub fn with_entities(table: impl Into<String>, entities: Vec<Entity>) -> StorageResult<Self> {
        let store = Self::new(table);
        store.upsert_all(entities)?;
        Ok(store)
    }
}

impl EntityStore for MemoryEntityStore {
    fn table(&self) -> &str {
        &self.table
    }

    fn upsert_all(&self, entities: Vec<Entity>) -> StorageResult<usize> {
        self.data.write().upsert(&self.table, entities)
    }

    fn find_all_by_name(&self, name: &str) -> StorageResult<Vec<Entity>> {
        Ok(self.data.read().find_by_name(name))
    }

    fn delete(&self, key: &EntityKey) -> StorageResult<bool> {
        Ok(self.data.write().rows.remove(key).is_some())
    }

    fn get(&self, key: &EntityKey) -> StorageResult<Option<Entity>> {
        Ok(self.data.read().rows.get(key).cloned())
    }

    fn all(&self) -> StorageResult<Vec<Entity>> {
        Ok(self.data.read().rows.values().cloned().collect())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.data.read().rows.len())
    }
}
