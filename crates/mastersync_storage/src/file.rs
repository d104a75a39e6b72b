//! File-backed entity store.

use crate::dir::StoreDir;
use crate::error::StorageResult;
use crate::store::{EntityStore, Table};
use mastersync_core::{Entity, EntityKey};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Serialize, Deserialize)]
struct TableFile {
    shape: Option<String>,
    rows: Vec<Entity>,
}

/// An entity store persisted as one JSON file per table.
///
/// The table is cached in memory; every mutation rewrites the file through
/// [`StoreDir::write_atomic`] while holding the write lock, so readers in
/// other processes see either the old or the new table, never a mix.
#[derive(Debug)]
pub struct FileEntityStore {
    table: String,
    path: PathBuf,
    dir: Arc<StoreDir>,
    data: RwLock<Table>,
}

impl FileEntityStore {
    /// Opens a table inside a store directory, loading it if present.
    ///
    /// # Errors
    ///
    /// Fails on invalid table names, I/O errors or a corrupt table file.
    pub fn open(dir: Arc<StoreDir>, table: impl Into<String>) -> StorageResult<Self> {
        let table = table.into();
        let path = dir.table_path(&table)?;

        let data = match dir.read(&path)? {
            Some(bytes) => {
                let file: TableFile = serde_json::from_slice(&bytes)?;
                let mut loaded = Table {
                    shape: file.shape,
                    ..Table::default()
                };
                for entity in file.rows {
                    loaded.rows.insert(entity.key.clone(), entity);
                }
                loaded
            }
            None => Table::default(),
        };

        tracing::debug!(table = %table, rows = data.rows.len(), "table opened");
        Ok(Self {
            table,
            path,
            dir,
            data: RwLock::new(data),
        })
    }

    fn persist(&self, data: &Table) -> StorageResult<()> {
        let file = TableFile {
            shape: data.shape.clone(),
            rows: data.rows.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;
        self.dir.write_atomic(&self.path, &bytes)
    }

    /// Applies a mutation to a copy and commits it only if persisting works.
    fn mutate<T>(&self, f: impl FnOnce(&mut Table) -> StorageResult<T>) -> StorageResult<T> {
        let mut guard = self.data.write();
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(out)
    }
}

impl EntityStore for FileEntityStore {
    fn table(&self) -> &str {
        &self.table
    }

    fn upsert_all(&self, entities: Vec<Entity>) -> StorageResult<usize> {
        let table = self.table.clone();
        self.mutate(|data| data.upsert(&table, entities))
    }

    fn find_all_by_name(&self, name: &str) -> StorageResult<Vec<Entity>> {
        Ok(self.data.read().find_by_name(name))
    }

    fn delete(&self, key: &EntityKey) -> StorageResult<bool> {
        self.mutate(|data| Ok(data.rows.remove(key).is_some()))
    }

    fn delete_all(&self, keys: &[EntityKey]) -> StorageResult<usize> {
        self.mutate(|data| Ok(keys.iter().filter(|k| data.rows.remove(*k).is_some()).count()))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use mastersync_core::FieldValue;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn center(id: &str, lang: &str, name: &str) -> Entity {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), FieldValue::Text(id.to_string()));
        fields.insert("langCode".to_string(), FieldValue::Text(lang.to_string()));
        fields.insert("name".to_string(), FieldValue::Text(name.to_string()));
        fields.insert("numberOfKiosks".to_string(), FieldValue::Integer(4));
        Entity {
            shape: "RegistrationCenter".to_string(),
            key: EntityKey::new([id, lang]),
            fields,
        }
    }

    #[test]
    fn survives_reopen() {
        let temp = tempdir().unwrap();
        {
            let dir = Arc::new(StoreDir::open(temp.path(), true).unwrap());
            let store = FileEntityStore::open(dir, "RegistrationCenter").unwrap();
            store
                .upsert_all(vec![
                    center("10001", "eng", "Center A"),
                    center("10001", "fra", "Centre A"),
                ])
                .unwrap();
            store.delete(&EntityKey::new(["10001", "eng"])).unwrap();
        }

        let dir = Arc::new(StoreDir::open(temp.path(), true).unwrap());
        let store = FileEntityStore::open(dir, "RegistrationCenter").unwrap();
        assert_eq!(store.len().unwrap(), 1);

        let entity = store
            .get(&EntityKey::new(["10001", "fra"]))
            .unwrap()
            .unwrap();
        assert_eq!(entity.name(), Some("Centre A"));
        assert_eq!(entity.get("numberOfKiosks"), Some(&FieldValue::Integer(4)));
    }

    #[test]
    fn rejected_upsert_leaves_file_untouched() {
        let temp = tempdir().unwrap();
        let dir = Arc::new(StoreDir::open(temp.path(), true).unwrap());
        let store = FileEntityStore::open(Arc::clone(&dir), "RegistrationCenter").unwrap();
        store.upsert_all(vec![center("1", "eng", "a")]).unwrap();

        let mut stray = center("2", "eng", "b");
        stray.shape = "Location".to_string();
        let err = store.upsert_all(vec![stray]).unwrap_err();
        assert!(matches!(err, StorageError::Constraint(_)));

        let reopened_bytes = dir
            .read(&dir.table_path("RegistrationCenter").unwrap())
            .unwrap()
            .unwrap();
        let file: TableFile = serde_json::from_slice(&reopened_bytes).unwrap();
        assert_eq!(file.rows.len(), 1);
    }

    #[test]
    fn corrupt_table_is_serialization_error() {
        let temp = tempdir().unwrap();
        let dir = Arc::new(StoreDir::open(temp.path(), true).unwrap());
        let path = dir.table_path("Language").unwrap();
        std::fs::write(&path, b"not json").unwrap();

        let err = FileEntityStore::open(dir, "Language").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn delete_all_rewrites_once() {
        let temp = tempdir().unwrap();
        let dir = Arc::new(StoreDir::open(temp.path(), true).unwrap());
        let store = FileEntityStore::open(dir, "RegistrationCenter").unwrap();
        store
            .upsert_all(vec![center("1", "eng", "a"), center("2", "eng", "b")])
            .unwrap();

        let removed = store
            .delete_all(&[EntityKey::new(["1", "eng"]), EntityKey::new(["9", "eng"])])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.find_all_by_name("B").unwrap().len(), 1);
    }
}
