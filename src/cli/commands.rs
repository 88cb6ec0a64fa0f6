//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PokeAPI bridge CLI
#[derive(Parser, Debug)]
#[command(name = "pokedex-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connector definition (built-in name or YAML file)
    #[arg(short, long, global = true, default_value = "pokedex")]
    pub connector: PathBuf,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List table ids
    Tables,

    /// Validate connector definition
    Validate,

    /// Show table schemas
    Schema {
        /// Sample items per table to infer column types (0 = static schema)
        #[arg(long, default_value = "0")]
        sample: usize,
    },

    /// Fetch one table and print its flattened rows as JSON lines
    Fetch {
        /// Table id
        #[arg(short, long)]
        table: String,

        /// Last record the host already has; fetching resumes after it
        #[arg(long)]
        last_record: Option<String>,

        /// Ceiling on items fetched (0 = no ceiling)
        #[arg(long)]
        max_limit: Option<usize>,

        /// Skip the cache for this run
        #[arg(long)]
        no_cache: bool,

        /// Write rows to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the cache HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// DuckDB database file (in-memory when omitted)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
