//! Seal command implementation.

use super::read_batch;
use crate::error::{CliError, CliResult};
use crate::keys::KeyArgs;
use mastersync_codec::seal_payload;
use mastersync_protocol::{CategoryDataset, SyncBatch};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Encrypts the records in `input` and appends them to the batch file.
///
/// The batch file is created when it does not exist yet.
pub fn run(
    batch_path: &Path,
    category: &str,
    dynamic: bool,
    input: &Path,
    key: &KeyArgs,
) -> CliResult<()> {
    let cipher = key.cipher()?;
    let records = read_records(input)?;
    let payload = seal_payload(&cipher, &records)?;

    let mut batch = if batch_path.exists() {
        read_batch(batch_path)?
    } else {
        SyncBatch::default()
    };
    let dataset = if dynamic {
        CategoryDataset::dynamic(category, Some(payload))
    } else {
        CategoryDataset::fixed(category, Some(payload))
    };
    batch.push(dataset);

    let json = batch.to_json_pretty()?;
    fs::write(batch_path, json).map_err(|e| CliError::file(batch_path, e))?;

    tracing::info!(
        category,
        dynamic,
        records = records.len(),
        datasets = batch.entries.len(),
        "dataset sealed"
    );
    println!(
        "Sealed {} record(s) as '{}' into {}",
        records.len(),
        category,
        batch_path.display()
    );
    Ok(())
}

fn read_records(input: &Path) -> CliResult<Vec<Value>> {
    let bytes = fs::read(input).map_err(|e| CliError::file(input, e))?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| CliError::Input(format!("{}: {e}", input.display())))?;
    match value {
        Value::Array(records) => Ok(records),
        _ => Err(CliError::Input(format!(
            "{}: expected a JSON array of records",
            input.display()
        ))),
    }
}
