//! Entity store port.

use crate::error::{StorageError, StorageResult};
use mastersync_core::{Entity, EntityKey};
use std::collections::BTreeMap;

/// Persistent table for one category.
///
/// `upsert_all` is the only write path the sync engine uses: insert or
/// replace by primary key. Stores are shared across sync tasks, so every
/// method takes `&self` and implementations synchronize internally.
///
/// # Invariants
///
/// - After `upsert_all(v)`, `get(k)` returns the last entity of `v` keyed `k`
/// - Upserting the same entities twice leaves the table unchanged
/// - A table holds entities of a single shape
pub trait EntityStore: Send + Sync {
    /// Label of the table, used in logs and file names.
    fn table(&self) -> &str;

    /// Inserts or replaces every entity by key. Returns how many were written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Constraint`] if the entities do not all share
    /// the table's shape.
    fn upsert_all(&self, entities: Vec<Entity>) -> StorageResult<usize>;

    /// Returns every entity whose `name` field equals `name`, ignoring case.
    fn find_all_by_name(&self, name: &str) -> StorageResult<Vec<Entity>>;

    /// Deletes the entity with the given key. Returns true if it existed.
    fn delete(&self, key: &EntityKey) -> StorageResult<bool>;

    /// Deletes several entities. Returns how many existed.
    fn delete_all(&self, keys: &[EntityKey]) -> StorageResult<usize> {
        let mut removed = 0;
        for key in keys {
            if self.delete(key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Returns the entity with the given key.
    fn get(&self, key: &EntityKey) -> StorageResult<Option<Entity>>;

    /// Returns every entity in key order.
    fn all(&self) -> StorageResult<Vec<Entity>>;

    /// Number of stored entities.
    fn len(&self) -> StorageResult<usize>;

    /// Returns true if the table is empty.
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// In-memory table contents shared by the store implementations.
#[derive(Debug, Default, Clone)]
pub(crate) struct Table {
    /// Shape fixed by the first non-empty upsert.
    pub(crate) shape: Option<String>,
    pub(crate) rows: BTreeMap<EntityKey, Entity>,
}

impl Table {
    /// Validates the whole batch before touching any row.
    pub(crate) fn upsert(&mut self, table: &str, entities: Vec<Entity>) -> StorageResult<usize> {
        let Some(first) = entities.first() else {
            return Ok(0);
        };
        let shape = self.shape.clone().unwrap_or_else(|| first.shape.clone());

        if let Some(stray) = entities.iter().find(|e| e.shape != shape) {
            return Err(StorageError::constraint(format!(
                "table '{table}' holds {shape}, refusing {} entity {}",
                stray.shape, stray.key
            )));
        }

        self.shape = Some(shape);
        let written = entities.len();
        for entity in entities {
            self.rows.insert(entity.key.clone(), entity);
        }
        Ok(written)
    }

    pub(crate) fn find_by_name(&self, name: &str) -> Vec<Entity> {
        let wanted = name.to_lowercase();
        self.rows
            .values()
            .filter(|e| e.name().is_some_and(|n| n.to_lowercase() == wanted))
            .cloned()
            .collect()
    }
}
