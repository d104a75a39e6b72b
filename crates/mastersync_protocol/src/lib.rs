//! # MasterSync Protocol
//!
//! Wire types exchanged with the central authority.
//!
//! - [`SyncBatch`] / [`CategoryDataset`] - one round of encrypted datasets
//! - [`BatchRequest`] - parameters of the client-settings fetch
//! - [`ResponseEnvelope`] - the `{response, errors}` wrapper of every endpoint
//! - [`IdentitySchema`] / [`ProcessSpec`] - schema sync documents
//!
//! All documents are JSON with camelCase keys.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod envelope;
mod error;
mod request;
mod schema;

pub use batch::{CategoryDataset, CategoryKind, SyncBatch};
pub use envelope::{ResponseEnvelope, ServiceError};
pub use error::{ProtocolError, ProtocolResult};
pub use request::{schema_url, BatchRequest, CLIENT_SETTINGS_PATH, SCHEMA_PATH};
pub use schema::{IdentitySchema, ProcessSpec, PROCESS_KEY_SUFFIX};
