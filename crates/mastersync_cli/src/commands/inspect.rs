//! Inspect command implementation.

use super::read_batch;
use crate::error::{CliError, CliResult};
use mastersync_protocol::SyncBatch;
use serde::Serialize;
use std::path::Path;

/// Batch contents without the payloads.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    /// Server timestamp, if present.
    pub last_sync_time: Option<String>,
    /// Datasets in wire order.
    pub datasets: Vec<DatasetSummary>,
}

/// One dataset line.
#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    /// Category name.
    pub category: String,
    /// Wire kind.
    pub kind: &'static str,
    /// Encoded payload length in bytes.
    pub payload_bytes: usize,
    /// Whether an earlier dataset of the same fixed category hides this one.
    pub shadowed: bool,
}

impl BatchSummary {
    /// Summarizes a batch.
    #[must_use]
    pub fn of(batch: &SyncBatch) -> Self {
        let shadowed = batch.shadowed();
        let datasets = batch
            .entries
            .iter()
            .map(|d| DatasetSummary {
                category: d.category_name.clone(),
                kind: d.kind.as_wire(),
                payload_bytes: d.payload_len(),
                shadowed: shadowed.iter().any(|s| std::ptr::eq(*s, d)),
            })
            .collect();
        Self {
            last_sync_time: batch.last_sync_time.clone(),
            datasets,
        }
    }
}

/// Lists the datasets of a batch file.
pub fn run(batch: &Path, format: &str) -> CliResult<()> {
    let summary = BatchSummary::of(&read_batch(batch)?);

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| CliError::Input(format!("summary is not serializable: {e}")))?;
            println!("{json}");
        }
        _ => {
            println!("Batch: {}", batch.display());
            println!(
                "Last sync time: {}",
                summary.last_sync_time.as_deref().unwrap_or("-")
            );
            println!();
            println!("{:<32} {:<16} {:>10}", "Category", "Kind", "Bytes");
            println!("{}", "-".repeat(60));
            for d in &summary.datasets {
                let note = if d.shadowed { "  (ignored)" } else { "" };
                println!(
                    "{:<32} {:<16} {:>10}{}",
                    d.category, d.kind, d.payload_bytes, note
                );
            }
            println!();
            println!("Total datasets: {}", summary.datasets.len());
        }
    }

    Ok(())
}
