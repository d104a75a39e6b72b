//! Stores command implementation.

use crate::error::{CliError, CliResult};
use mastersync_storage::{EntityStore, FileEntityStore, FileSchemaStore, SchemaStore, StoreDir};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Store directory contents.
#[derive(Debug, Serialize)]
pub struct StoreSummary {
    /// Record counts by table, sorted by name.
    pub tables: Vec<TableSummary>,
    /// Version of the newest identity schema, if any.
    pub identity_schema_version: Option<f64>,
}

/// One table line.
#[derive(Debug, Serialize)]
pub struct TableSummary {
    /// Table (category) name.
    pub table: String,
    /// Number of records.
    pub records: usize,
}

/// Reads the summary of an existing store directory.
pub fn summarize(path: &Path) -> CliResult<StoreSummary> {
    let dir = Arc::new(StoreDir::open(path, false)?);
    let mut tables = Vec::new();
    for name in dir.table_names()? {
        let store = FileEntityStore::open(Arc::clone(&dir), name.as_str())?;
        tables.push(TableSummary {
            records: store.len()?,
            table: name,
        });
    }
    let schemas = FileSchemaStore::open(dir)?;
    let identity_schema_version = schemas.latest_identity_schema()?.map(|(v, _)| v);
    Ok(StoreSummary {
        tables,
        identity_schema_version,
    })
}

/// Prints per-category record counts of a store directory.
pub fn run(store: &Path, format: &str) -> CliResult<()> {
    let summary = summarize(store)?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| CliError::Input(format!("summary is not serializable: {e}")))?;
            println!("{json}");
        }
        _ => {
            println!("Store: {}", store.display());
            println!();
            println!("{:<32} {:>10}", "Table", "Records");
            println!("{}", "-".repeat(43));
            for t in &summary.tables {
                println!("{:<32} {:>10}", t.table, t.records);
            }
            println!();
            match summary.identity_schema_version {
                Some(v) => println!("Identity schema: version {v}"),
                None => println!("Identity schema: none"),
            }
        }
    }

    Ok(())
}
