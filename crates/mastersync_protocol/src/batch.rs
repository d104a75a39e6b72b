//! Sync batches and their category datasets.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

/// Whether a dataset carries a fixed shape or dynamic field definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryKind {
    /// Records conform to a catalog shape.
    #[default]
    Fixed,
    /// Records are data-driven field definitions.
    Dynamic,
}

impl CategoryKind {
    /// Wire value written for fixed datasets.
    pub const FIXED_WIRE: &'static str = "structured-data";
    /// Wire value written for dynamic datasets.
    pub const DYNAMIC_WIRE: &'static str = "dynamic";

    /// Classifies a wire `entityType`. Only `"dynamic"`, in any case, is dynamic.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case(Self::DYNAMIC_WIRE) {
            CategoryKind::Dynamic
        } else {
            CategoryKind::Fixed
        }
    }

    /// Returns the canonical wire value.
    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            CategoryKind::Fixed => Self::FIXED_WIRE,
            CategoryKind::Dynamic => Self::DYNAMIC_WIRE,
        }
    }
}

impl Serialize for CategoryKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for CategoryKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(CategoryKind::Fixed, CategoryKind::from_wire))
    }
}

/// One category's encrypted dataset within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDataset {
    /// Wire category name, e.g. `Machine`.
    #[serde(rename = "entityName")]
    pub category_name: String,
    /// Dataset kind.
    #[serde(rename = "entityType", default)]
    pub kind: CategoryKind,
    /// Base64 encrypted payload; absent or empty means no records.
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub encrypted_payload: Option<String>,
}

impl CategoryDataset {
    /// Creates a fixed dataset.
    pub fn fixed(category_name: impl Into<String>, payload: Option<String>) -> Self {
        Self {
            category_name: category_name.into(),
            kind: CategoryKind::Fixed,
            encrypted_payload: payload,
        }
    }

    /// Creates a dynamic dataset.
    pub fn dynamic(category_name: impl Into<String>, payload: Option<String>) -> Self {
        Self {
            category_name: category_name.into(),
            kind: CategoryKind::Dynamic,
            encrypted_payload: payload,
        }
    }

    /// Payload length in characters, zero if absent.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.encrypted_payload.as_ref().map_or(0, String::len)
    }
}

/// The unit of work fetched in one synchronization round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncBatch {
    /// Datasets in wire order.
    #[serde(rename = "dataToSync", default)]
    pub entries: Vec<CategoryDataset>,
    /// Server timestamp to echo back on the next delta request.
    #[serde(rename = "lastSyncTime", default, skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<String>,
}

impl SyncBatch {
    /// Creates a batch from datasets.
    #[must_use]
    pub fn new(entries: Vec<CategoryDataset>) -> Self {
        Self {
            entries,
            last_sync_time: None,
        }
    }

    /// Parses a batch from JSON.
    pub fn from_slice(bytes: &[u8]) -> ProtocolResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::json("sync batch", e))
    }

    /// Renders the batch as pretty JSON.
    pub fn to_json_pretty(&self) -> ProtocolResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ProtocolError::json("sync batch", e))
    }

    /// Appends a dataset.
    pub fn push(&mut self, dataset: CategoryDataset) {
        self.entries.push(dataset);
    }

    /// Returns the authoritative fixed dataset of a category: the first one.
    #[must_use]
    pub fn fixed_dataset(&self, category: &str) -> Option<&CategoryDataset> {
        self.entries
            .iter()
            .find(|d| d.kind == CategoryKind::Fixed && d.category_name == category)
    }

    /// Returns every dynamic dataset in wire order.
    pub fn dynamic_datasets(&self) -> impl Iterator<Item = &CategoryDataset> {
        self.entries
            .iter()
            .filter(|d| d.kind == CategoryKind::Dynamic)
    }

    /// Returns fixed datasets that repeat an earlier (name, kind) pair and
    /// are therefore ignored.
    #[must_use]
    pub fn shadowed(&self) -> Vec<&CategoryDataset> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|d| d.kind == CategoryKind::Fixed)
            .filter(|d| !seen.insert(d.category_name.as_str()))
            .collect()
    }
}
