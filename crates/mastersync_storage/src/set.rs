//! Store sets: category name to entity store.

use crate::dir::StoreDir;
use crate::error::StorageResult;
use crate::file::FileEntityStore;
use crate::memory::MemoryEntityStore;
use crate::store::EntityStore;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// The storage ports of one sync round, keyed by wire category name.
///
/// Cloning is cheap; stores are shared.
#[derive(Clone, Default)]
pub struct StoreSet {
    stores: HashMap<String, Arc<dyn EntityStore>>,
}

impl StoreSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates one in-memory store per category.
    #[must_use]
    pub fn in_memory<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for category in categories {
            let category = category.into();
            let store = Arc::new(MemoryEntityStore::new(category.clone()));
            set.insert(category, store);
        }
        set
    }

    /// Opens one file-backed store per category inside a store directory.
    ///
    /// All stores share the directory and its lock.
    pub fn open_dir<I, S>(dir: Arc<StoreDir>, categories: I) -> StorageResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for category in categories {
            let category = category.into();
            let store = FileEntityStore::open(Arc::clone(&dir), category.clone())?;
            set.insert(category, Arc::new(store));
        }
        Ok(set)
    }

    /// Opens (creating if missing) a directory and its stores.
    pub fn open_path<I, S>(path: &Path, categories: I) -> StorageResult<(Arc<StoreDir>, Self)>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dir = Arc::new(StoreDir::open(path, true)?);
        let set = Self::open_dir(Arc::clone(&dir), categories)?;
        Ok((dir, set))
    }

    /// Adds or replaces the store of a category.
    pub fn insert(&mut self, category: impl Into<String>, store: Arc<dyn EntityStore>) {
        self.stores.insert(category.into(), store);
    }

    /// Builder form of [`StoreSet::insert`].
    #[must_use]
    pub fn with_store(mut self, category: impl Into<String>, store: Arc<dyn EntityStore>) -> Self {
        self.insert(category, store);
        self
    }

    /// Returns the store of a category.
    #[must_use]
    pub fn get(&self, category: &str) -> Option<Arc<dyn EntityStore>> {
        self.stores.get(category).cloned()
    }

    /// Category names, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stores.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Returns true if the set has no stores.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl std::fmt::Debug for StoreSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSet")
            .field("categories", &self.categories())
            .finish()
    }
}
