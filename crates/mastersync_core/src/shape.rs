//! Shape descriptors.
//!
//! A shape is the closed, statically known structure of one storage table:
//! its ordered fields with declared types, and its primary key.

use std::fmt;

/// Declared type of a shape field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// UTF-8 text.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// Floating point number.
    Decimal,
    /// Boolean flag.
    Boolean,
    /// Date-time without zone, normalized to UTC.
    Timestamp,
    /// Opaque serialized JSON fragment, never coerced.
    Json,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Timestamp => "timestamp",
            FieldType::Json => "json",
        };
        f.write_str(name)
    }
}

/// One field of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as it appears on the wire (camelCase).
    pub name: &'static str,
    /// Declared type.
    pub ty: FieldType,
    /// Whether the field must be present and non-null.
    pub required: bool,
}

impl FieldSpec {
    /// A field that must be present.
    #[must_use]
    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
        }
    }

    /// A field that may be absent or null.
    #[must_use]
    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
        }
    }
}

/// The structure records of one category must conform to.
#[derive(Debug, PartialEq, Eq)]
pub struct Shape {
    /// Shape (storage table) name.
    pub name: &'static str,
    /// Ordered field list.
    pub fields: &'static [FieldSpec],
    /// Names of the fields forming the primary key, in key order.
    pub primary_key: &'static [&'static str],
}

impl Shape {
    /// Creates a shape descriptor.
    #[must_use]
    pub const fn new(
        name: &'static str,
        fields: &'static [FieldSpec],
        primary_key: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            fields,
            primary_key,
        }
    }

    /// Looks up a field by wire name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if every key field is declared and required.
    ///
    /// Upsert-by-key is only well defined when this holds.
    #[must_use]
    pub fn is_well_keyed(&self) -> bool {
        !self.primary_key.is_empty()
            && self
                .primary_key
                .iter()
                .all(|k| self.field(k).is_some_and(|f| f.required))
    }
}
