//! # MasterSync Storage
//!
//! Storage ports and adapters for synchronized master data.
//!
//! Stores are **upsert tables**: the sync engine only ever inserts or
//! replaces entities by primary key, and deletes by key during dynamic
//! field duplicate resolution. Nothing here knows about payloads, shape
//! resolution or the network.
//!
//! ## Available Stores
//!
//! - [`MemoryEntityStore`] - For testing and ephemeral clients
//! - [`FileEntityStore`] - One JSON table file per category in a [`StoreDir`]
//! - [`MemorySchemaStore`] / [`FileSchemaStore`] - Identity schemas and process specs
//!
//! [`StoreSet`] maps wire category names to stores for one sync round.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dir;
mod error;
mod file;
mod memory;
mod schema;
mod set;
mod store;

pub use dir::StoreDir;
pub use error::{StorageError, StorageResult};
pub use file::FileEntityStore;
pub use memory::MemoryEntityStore;
pub use schema::{FileSchemaStore, MemorySchemaStore, SchemaStore};
pub use set::StoreSet;
pub use store::EntityStore;
