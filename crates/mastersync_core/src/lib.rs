//! # MasterSync Core
//!
//! Category shapes, shape resolution and record building for MasterSync.
//!
//! This crate provides:
//! - [`Shape`] descriptors and the closed standard [`catalog`]
//! - [`CategoryRegistry`] resolving wire category names to shapes
//! - [`RecordBuilder`] turning decoded records into typed [`Entity`] values
//! - [`DynamicFieldRecord`] for data-driven "dynamic" categories
//!
//! ## Resolution tiers
//!
//! A wire category name is resolved deterministically:
//! 1. alias table (historical or renamed categories)
//! 2. a shape with the same name
//! 3. a shape named `"Reg" + name`
//!
//! Anything else is [`CoreError::UnknownCategory`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod builder;
pub mod catalog;
mod entity;
mod error;
mod registry;
mod shape;

pub use builder::RecordBuilder;
pub use entity::{DynamicFieldRecord, Entity, EntityKey, FieldValue, EMPTY_VALUE_JSON};
pub use error::{BuildError, BuildResult, CoreError, CoreResult};
pub use mastersync_codec::GenericRecord;
pub use registry::{
    CategoryRegistry, RegistryBuilder, ResolutionTier, ResolvedShape, FALLBACK_PREFIX,
};
pub use shape::{FieldSpec, FieldType, Shape};
