//! # MasterSync Engine
//!
//! Concurrent master-data sync for registration clients.
//!
//! This crate provides:
//! - Sync orchestrator (fan-out of logical groups, fan-in to one verdict)
//! - Category sync tasks (decode → resolve → build → upsert)
//! - Dynamic field sync with duplicate resolution
//! - Identity schema sync
//! - Transport port, HTTP transport and response signature verification
//!
//! ## Architecture
//!
//! One round processes one [`SyncBatch`](mastersync_protocol::SyncBatch):
//! 1. Every logical group of the [`SyncPlan`] runs on its own scoped thread
//! 2. Categories inside a group run strictly in order
//! 3. The orchestrator joins every group and folds the results into a
//!    [`SyncVerdict`]
//!
//! ## Key Invariants
//!
//! - A failing group never cancels the others
//! - Writes already made by a failing group are kept
//! - Upsert by primary key is the only write mode, so rounds are idempotent
//! - The orchestrator never retries; callers decide using
//!   [`SyncError::is_retryable`]

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod orchestrator;
mod schema;
mod task;
mod transport;
mod verify;

pub use config::{
    GroupKind, LogicalGroup, SyncConfig, SyncPlan, DEFAULT_TRIGGER_POINT, DYNAMIC_FIELD_STORE,
};
pub use error::{MasterSyncFailed, SyncError, SyncResult};
pub use http::{HttpClient, HttpResponse, HttpTransport};
pub use orchestrator::{
    GroupReport, RoundReport, SyncOrchestrator, SyncStats, SyncVerdict, TaskFailure,
};
pub use schema::{SchemaSync, SCHEMA_CATEGORY};
pub use task::{CategorySyncTask, DynamicFieldSyncTask, TaskResult, TaskState};
pub use transport::{MockTransport, SyncTransport};
pub use verify::{HmacVerifier, ResponseVerifier, VerifyingClient};
