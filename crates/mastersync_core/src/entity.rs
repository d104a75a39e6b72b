//! Typed entities and dynamic field records.

use crate::catalog::DYNAMIC_FIELD;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value stored when a dynamic record carries no `fieldVal`.
pub const EMPTY_VALUE_JSON: &str = "[]";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Absent optional field.
    Null,
    /// Text.
    Text(String),
    /// Integer.
    Integer(i64),
    /// Decimal.
    Decimal(f64),
    /// Boolean.
    Boolean(bool),
    /// UTC date-time.
    Timestamp(NaiveDateTime),
    /// Serialized JSON fragment.
    Json(String),
}

impl FieldValue {
    /// Renders the value as a primary-key part.
    #[must_use]
    pub fn key_part(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Text(s) | FieldValue::Json(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Decimal(d) => d.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Returns the text if this is a `Text` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for `Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// Primary key of an entity: the ordered renderings of its key fields.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(pub Vec<String>);

impl EntityKey {
    /// Creates a key from its parts.
    #[must_use]
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Returns the key parts.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("|"))
    }
}

/// A record conforming to a shape, ready to be upserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Shape (table) name.
    pub shape: String,
    /// Primary key.
    pub key: EntityKey,
    /// Field values by wire name.
    pub fields: BTreeMap<String, FieldValue>,
}

impl Entity {
    /// Returns a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Returns a text field.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    /// Returns the `name` field, if the shape has one and it is set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }
}

/// A data-driven field definition with an opaque value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicFieldRecord {
    /// Unique id.
    pub id: String,
    /// Declared data type of the field values.
    pub data_type: Option<String>,
    /// Field name, e.g. `gender` or `religion`.
    pub name: Option<String>,
    /// Language of the value list.
    pub lang_code: Option<String>,
    /// Serialized value list, `"[]"` when the source had none.
    pub value_json: String,
    /// Whether the field is active.
    pub active: bool,
}

impl DynamicFieldRecord {
    /// Parses the stored value list.
    pub fn value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.value_json)
    }

    /// Converts the record into a `DynamicField` entity keyed by id.
    #[must_use]
    pub fn into_entity(self) -> Entity {
        let opt_text = |value: Option<String>| value.map_or(FieldValue::Null, FieldValue::Text);

        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), FieldValue::Text(self.id.clone()));
        fields.insert("dataType".to_string(), opt_text(self.data_type));
        fields.insert("name".to_string(), opt_text(self.name));
        fields.insert("langCode".to_string(), opt_text(self.lang_code));
        fields.insert("valueJson".to_string(), FieldValue::Json(self.value_json));
        fields.insert("isActive".to_string(), FieldValue::Boolean(self.active));

        Entity {
            shape: DYNAMIC_FIELD.name.to_string(),
            key: EntityKey::new([self.id]),
            fields,
        }
    }
}
