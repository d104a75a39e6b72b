//! # MasterSync Testkit
//!
//! Test utilities for MasterSync.
//!
//! This crate provides:
//! - Fixture keys, sealed payloads and sample records for every standard category
//! - A batch builder and temporary store directories
//! - Instrumented storage ports (recording, rendezvous, panicking)
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mastersync_testkit::prelude::*;
//!
//! #[test]
//! fn syncs_languages() {
//!     let batch = BatchBuilder::new().sample("Language").build();
//!     let (stores, recorded) = recording_set(["Language"]);
//!     // ... run a sync round against `stores`
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stores;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stores::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stores::*;
