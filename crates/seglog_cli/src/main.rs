//! seglog CLI
//!
//! Command-line tools for inspecting and maintaining seglog logs.
//!
//! # Commands
//!
//! - `inspect` - Display offsets and segment layout
//! - `append` - Append records
//! - `read` - Read one record by offset
//! - `consume` - Read records from an offset to the end of the log
//! - `truncate` - Drop segments at or below an offset
//! - `dump` - Walk the raw store frames
//! - `reset` - Delete all data and start over

mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::ConfigArgs;
use seglog_core::Log;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// seglog command-line log tools.
#[derive(Parser)]
#[command(name = "seglog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the log directory
    #[arg(global = true, short, long)]
    dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display offsets and segment layout
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Append one record per value
    Append {
        /// Record values
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Read the record at an offset
    Read {
        /// Offset to read
        offset: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Read records from an offset to the end of the log
    Consume {
        /// Start from this offset (default: lowest offset)
        #[arg(long)]
        from: Option<u64>,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Remove segments whose records all lie at or below an offset
    Truncate {
        /// Highest offset that may be discarded
        lowest: u64,
    },

    /// Walk the raw frames of every store file
    Dump {
        /// Maximum number of frames to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Delete all data and start over with one empty segment
    Reset,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("seglog CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("seglog Core v{}", seglog_core::VERSION);
        return Ok(());
    }

    let dir = cli.dir.ok_or("Log directory required (--dir)")?;
    let config = cli.config.resolve()?;
    let log = Log::open(&dir, config)?;
    info!("Opened log at {:?}", dir);

    let result = match cli.command {
        Commands::Inspect { format } => commands::inspect::run(&log, &format),
        Commands::Append { values } => commands::append::run(&log, &values),
        Commands::Read { offset, format } => commands::read::run(&log, offset, &format),
        Commands::Consume {
            from,
            limit,
            format,
        } => commands::consume::run(&log, from, limit, &format),
        Commands::Truncate { lowest } => commands::truncate::run(&log, lowest),
        Commands::Dump { limit, format } => commands::dump::run(&log, limit, &format),
        Commands::Reset => commands::reset::run(&log),
        Commands::Version => Ok(()),
    };

    // Close even on failure so index files are trimmed to their entries.
    log.close()?;
    result
}
