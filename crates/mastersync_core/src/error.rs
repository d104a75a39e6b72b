//! Error types for MasterSync core.

use crate::shape::FieldType;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for record building.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors raised while turning a generic record into an entity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A required field is absent or null.
    #[error("{shape}: missing required field '{field}'")]
    MissingField {
        /// Shape being built.
        shape: String,
        /// Name of the missing field.
        field: String,
    },

    /// A field value cannot be coerced to its declared type.
    #[error("{shape}: field '{field}' expected {expected}, found {found}")]
    TypeMismatch {
        /// Shape being built.
        shape: String,
        /// Name of the offending field.
        field: String,
        /// Declared field type.
        expected: FieldType,
        /// Short rendering of the value found.
        found: String,
    },
}

impl BuildError {
    /// Creates a missing field error.
    pub fn missing_field(shape: &str, field: &str) -> Self {
        Self::MissingField {
            shape: shape.to_string(),
            field: field.to_string(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(
        shape: &str,
        field: &str,
        expected: FieldType,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            shape: shape.to_string(),
            field: field.to_string(),
            expected,
            found: found.into(),
        }
    }
}

/// Errors that can occur in MasterSync core operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// No shape is resolvable for the category name.
    #[error("unknown category: no shape resolvable for '{name}'")]
    UnknownCategory {
        /// The wire category name.
        name: String,
    },

    /// A record could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),
}

impl CoreError {
    /// Creates an unknown category error.
    pub fn unknown_category(name: impl Into<String>) -> Self {
        Self::UnknownCategory { name: name.into() }
    }
}
