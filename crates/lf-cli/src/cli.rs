//! CLI argument definitions using clap derive API

use clap::Parser;

/// Landfall - apply versioned SQL scripts to a database exactly once
#[derive(Parser, Debug)]
#[command(name = "lf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connection string to the target database (`duckdb:<path>` for DuckDB)
    #[arg(short, long, env = "LANDFALL_CONNECTION")]
    pub connection: Option<String>,

    /// JSON file with a `connectionString` field
    #[arg(long, conflicts_with = "connection")]
    pub credentials: Option<String>,

    /// Directory containing migration scripts
    #[arg(short, long)]
    pub directory: Option<String>,

    /// Re-apply scripts whose content changed since they were applied
    #[arg(short, long)]
    pub force: bool,

    /// Run only this script from the directory
    #[arg(short, long)]
    pub script: Option<String>,

    /// Name of the migration history table (default: Migrations)
    #[arg(short, long)]
    pub table: Option<String>,

    /// Run every pending script in a transaction that is always rolled back
    #[arg(short, long)]
    pub preview: bool,

    /// Do not print per-script messages
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the project config file (default: ./landfall.yml)
    #[arg(long)]
    pub config: Option<String>,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
