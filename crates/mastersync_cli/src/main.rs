//! MasterSync CLI
//!
//! Command-line tools for offline master-data sync.
//!
//! # Commands
//!
//! - `sync` - Apply a batch file to a store directory
//! - `inspect` - List the datasets of a batch file
//! - `seal` - Encrypt records into a batch file
//! - `stores` - Show per-category record counts of a store directory

mod commands;
mod error;
mod keys;
mod offline;

use clap::{Parser, Subcommand};
use keys::KeyArgs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// MasterSync command-line tools.
#[derive(Parser)]
#[command(name = "mastersync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a batch file to a store directory
    Sync {
        /// Batch file (client settings response body)
        #[arg(short, long)]
        batch: PathBuf,

        /// Store directory, created if missing
        #[arg(short, long)]
        store: PathBuf,

        #[command(flatten)]
        key: KeyArgs,

        /// Identity schema document; schema sync is reported offline without it
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Trigger point recorded for schema sync
        #[arg(long, default_value = mastersync_engine::DEFAULT_TRIGGER_POINT)]
        trigger_point: String,

        /// Keep stored dynamic fields that share a name with incoming ones
        #[arg(long)]
        keep_duplicates: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the datasets of a batch file
    Inspect {
        /// Batch file
        #[arg(short, long)]
        batch: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Encrypt a JSON array of records and append it to a batch file
    Seal {
        /// Batch file, created if missing
        #[arg(short, long)]
        batch: PathBuf,

        /// Category name of the new dataset
        #[arg(short, long)]
        category: String,

        /// Mark the dataset as dynamic
        #[arg(long)]
        dynamic: bool,

        /// JSON file holding an array of records
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        key: KeyArgs,
    },

    /// Show per-category record counts of a store directory
    Stores {
        /// Store directory
        #[arg(short, long)]
        store: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sync {
            batch,
            store,
            key,
            schema,
            trigger_point,
            keep_duplicates,
            format,
        } => {
            let options = commands::sync::SyncOptions {
                batch,
                store,
                schema,
                trigger_point,
                resolve_duplicates: !keep_duplicates,
            };
            commands::sync::run(&options, &key, &format)?;
        }
        Commands::Inspect { batch, format } => {
            commands::inspect::run(&batch, &format)?;
        }
        Commands::Seal {
            batch,
            category,
            dynamic,
            input,
            key,
        } => {
            commands::seal::run(&batch, &category, dynamic, &input, &key)?;
        }
        Commands::Stores { store, format } => {
            commands::stores::run(&store, &format)?;
        }
        Commands::Version => {
            println!("MasterSync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
