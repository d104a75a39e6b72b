//! Sync command implementation.

use crate::error::{CliError, CliResult};
use crate::keys::KeyArgs;
use crate::offline::OfflineTransport;
use mastersync_engine::{
    RoundReport, SyncConfig, SyncOrchestrator, SyncPlan, SyncTransport,
};
use mastersync_protocol::BatchRequest;
use mastersync_storage::{FileSchemaStore, StoreSet};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Key index sent with offline fetches.
const OFFLINE_KEY_INDEX: &str = "offline";

/// Inputs of one offline round.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Batch file.
    pub batch: PathBuf,
    /// Store directory.
    pub store: PathBuf,
    /// Optional identity schema file.
    pub schema: Option<PathBuf>,
    /// Schema trigger point.
    pub trigger_point: String,
    /// Whether dynamic field duplicates are resolved.
    pub resolve_duplicates: bool,
}

/// Round summary printed by the command.
#[derive(Debug, Serialize)]
pub struct SyncSummary {
    /// Round id.
    pub round_id: String,
    /// Wall-clock time in milliseconds.
    pub elapsed_ms: u128,
    /// Whether every unit completed.
    pub success: bool,
    /// Group outcomes in plan order.
    pub groups: Vec<GroupSummary>,
    /// Failed units in plan order.
    pub failures: Vec<FailureSummary>,
}

/// One group line.
#[derive(Debug, Serialize)]
pub struct GroupSummary {
    /// Group name.
    pub group: String,
    /// Final state.
    pub state: String,
    /// Entities written.
    pub entities: usize,
}

/// One failed unit.
#[derive(Debug, Serialize)]
pub struct FailureSummary {
    /// Group name.
    pub group: String,
    /// Category the group stopped at.
    pub category: String,
    /// Error message.
    pub error: String,
    /// Whether retrying might help.
    pub retryable: bool,
}

impl SyncSummary {
    fn from_report(report: &RoundReport) -> Self {
        Self {
            round_id: report.round_id.to_string(),
            elapsed_ms: report.elapsed.as_millis(),
            success: report.verdict.is_success(),
            groups: report
                .groups
                .iter()
                .map(|g| GroupSummary {
                    group: g.group.clone(),
                    state: format!("{:?}", g.state).to_lowercase(),
                    entities: g.entities,
                })
                .collect(),
            failures: report
                .verdict
                .causes()
                .iter()
                .map(|f| FailureSummary {
                    group: f.group.clone(),
                    category: f.category.clone(),
                    error: f.cause.to_string(),
                    retryable: f.cause.is_retryable(),
                })
                .collect(),
        }
    }
}

/// Runs one round of the standard plan against a directory-backed store set.
///
/// Returns the verdict's error when any unit failed, so the process exits
/// non-zero.
pub fn run(options: &SyncOptions, key: &KeyArgs, format: &str) -> CliResult<()> {
    let report = run_round(options, key)?;
    let summary = SyncSummary::from_report(&report);

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| CliError::Input(format!("summary is not serializable: {e}")))?;
            println!("{json}");
        }
        _ => print_text_output(&summary),
    }

    report.verdict.into_result()?;
    Ok(())
}

/// Loads the batch and runs the round, returning its report.
pub fn run_round(options: &SyncOptions, key: &KeyArgs) -> CliResult<RoundReport> {
    let crypto = Arc::new(key.cipher()?);
    let config = SyncConfig::new()
        .with_plan(SyncPlan::standard())
        .with_schema_trigger_point(options.trigger_point.clone())
        .with_dynamic_duplicate_resolution(options.resolve_duplicates);

    let (dir, stores) = StoreSet::open_path(&options.store, config.plan.store_categories())?;
    let schema_store = Arc::new(FileSchemaStore::open(dir)?);
    let transport = Arc::new(OfflineTransport::new(
        options.batch.clone(),
        options.schema.clone(),
    ));

    let batch = transport.fetch(&BatchRequest::new(OFFLINE_KEY_INDEX))?;
    tracing::debug!(
        batch = %options.batch.display(),
        datasets = batch.entries.len(),
        "batch loaded"
    );

    let orchestrator = SyncOrchestrator::new(config, crypto, stores, schema_store, transport);
    Ok(orchestrator.run_round(&batch))
}

fn print_text_output(summary: &SyncSummary) {
    println!("MasterSync Round {}", summary.round_id);
    println!("==========================================");
    println!();
    for group in &summary.groups {
        println!(
            "  {:<22} {:<10} {:>6} entities",
            group.group, group.state, group.entities
        );
    }
    println!();
    if summary.failures.is_empty() {
        println!("Result: success ({} ms)", summary.elapsed_ms);
    } else {
        println!(
            "Result: {} failed unit(s) ({} ms)",
            summary.failures.len(),
            summary.elapsed_ms
        );
        for failure in &summary.failures {
            let hint = if failure.retryable { " [retryable]" } else { "" };
            println!(
                "  {}/{}: {}{}",
                failure.group, failure.category, failure.error, hint
            );
        }
    }
}
