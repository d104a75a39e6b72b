//! CLI command implementations.

pub mod inspect;
pub mod seal;
pub mod stores;
pub mod sync;

use crate::error::{CliError, CliResult};
use mastersync_protocol::SyncBatch;
use std::fs;
use std::path::Path;

/// Reads a batch file.
pub(crate) fn read_batch(path: &Path) -> CliResult<SyncBatch> {
    let bytes = fs::read(path).map_err(|e| CliError::file(path, e))?;
    Ok(SyncBatch::from_slice(&bytes)?)
}
