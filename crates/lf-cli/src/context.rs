//! Resolves CLI flags, `landfall.yml`, and defaults into one run setup

use anyhow::{bail, Context, Result};
use lf_core::{Credentials, ProjectConfig, RunOptions};
use lf_db::{Connector, DuckDbConnector};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Connection strings with this prefix select the DuckDB backend
pub const DUCKDB_PREFIX: &str = "duckdb:";

/// Everything a run needs, after precedence is applied
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Absolute scripts directory
    pub scripts_dir: PathBuf,

    /// History table name
    pub history_table: String,

    /// Connection string for the target database
    pub connection: String,

    /// Force, preview, and output flags
    pub options: RunOptions,
}

impl RunContext {
    /// Resolve the run setup for `cli`, with relative paths taken from `cwd`.
    ///
    /// Flags win over `landfall.yml`, which wins over built-in defaults.
    /// Paths inside the config file are relative to the file's directory.
    pub fn resolve(cli: &Cli, cwd: &Path) -> Result<Self> {
        let (config, root) = match &cli.config {
            Some(path) => {
                let path = cwd.join(path);
                let config = ProjectConfig::load(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                let root = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| cwd.to_path_buf());
                (config, root)
            }
            None => (
                ProjectConfig::load_from_dir_or_default(cwd)
                    .context("Failed to load project configuration")?,
                cwd.to_path_buf(),
            ),
        };

        let scripts_dir = match &cli.directory {
            Some(dir) => cwd.join(dir),
            None => config.scripts_dir_absolute(&root),
        };

        let history_table = cli
            .table
            .clone()
            .unwrap_or_else(|| config.history_table.clone());
        if history_table.trim().is_empty() {
            bail!("History table name cannot be empty");
        }

        let connection = resolve_connection(cli, &config, cwd, &root)?;

        Ok(Self {
            scripts_dir,
            history_table,
            connection,
            options: RunOptions {
                force: cli.force,
                preview: cli.preview,
                output: !cli.quiet,
            },
        })
    }
}

fn resolve_connection(
    cli: &Cli,
    config: &ProjectConfig,
    cwd: &Path,
    root: &Path,
) -> Result<String> {
    if let Some(connection) = &cli.connection {
        return Ok(connection.clone());
    }
    if let Some(path) = &cli.credentials {
        return read_credentials(&cwd.join(path));
    }
    if let Some(connection) = &config.connection {
        return Ok(connection.clone());
    }
    if let Some(path) = &config.credentials_file {
        return read_credentials(&root.join(path));
    }
    bail!("No connection string: pass --connection or --credentials, or set `connection` in landfall.yml")
}

fn read_credentials(path: &Path) -> Result<String> {
    Credentials::load_connection_string(path)
        .with_context(|| format!("Failed to read credentials from {}", path.display()))
}

/// Pick the backend for a connection string
pub fn connector_for(connection: &str) -> Result<Box<dyn Connector>> {
    if connection == ":memory:" {
        return Ok(Box::new(DuckDbConnector::new(connection)));
    }
    if let Some(path) = connection.strip_prefix(DUCKDB_PREFIX) {
        if path.is_empty() {
            bail!("DuckDB connection string needs a path, e.g. duckdb:dev.duckdb");
        }
        return Ok(Box::new(DuckDbConnector::new(path)));
    }
    sqlserver_connector(connection)
}

#[cfg(feature = "mssql")]
fn sqlserver_connector(connection: &str) -> Result<Box<dyn Connector>> {
    let connector =
        lf_db::MssqlConnector::new(connection).context("Invalid SQL Server connection string")?;
    Ok(Box::new(connector))
}

#[cfg(not(feature = "mssql"))]
fn sqlserver_connector(_connection: &str) -> Result<Box<dyn Connector>> {
    Err(lf_db::DbError::BackendUnavailable("sqlserver".to_string()).into())
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
