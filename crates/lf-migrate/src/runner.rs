//! Batch and single-script runs

use crate::engine::MigrationEngine;
use crate::error::{MigrateError, RunFailure};
use crate::result::{MigrationResult, RunReport};
use lf_core::{list_scripts, load_script, RunOptions, Script, DEFAULT_HISTORY_TABLE};
use lf_db::{Connector, Database};
use std::path::{Path, PathBuf};

/// Drives scripts from one directory through a [`MigrationEngine`]
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    scripts_dir: PathBuf,
    history_table: String,
}

impl MigrationRunner {
    /// Create a runner for `scripts_dir` using the default history table
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            history_table: DEFAULT_HISTORY_TABLE.to_string(),
        }
    }

    /// Record history in `table` instead of the default
    pub fn with_history_table(mut self, table: impl Into<String>) -> Self {
        self.history_table = table.into();
        self
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    pub fn history_table(&self) -> &str {
        &self.history_table
    }

    /// Apply every script in the directory, in filename order.
    ///
    /// Scripts are read before connecting, so an unreadable directory fails
    /// without touching the database. The first failing script stops the
    /// batch; scripts applied before it stay committed and are returned in
    /// [`RunFailure::completed`].
    pub async fn run_all(
        &self,
        connector: &dyn Connector,
        options: &RunOptions,
    ) -> Result<RunReport, RunFailure> {
        let scripts = list_scripts(&self.scripts_dir).map_err(|e| RunFailure {
            completed: Vec::new(),
            error: e.into(),
        })?;
        log::debug!(
            "Found {} script(s) in {}",
            scripts.len(),
            self.scripts_dir.display()
        );
        self.run_scripts(connector, options, &scripts).await
    }

    /// Apply the single script `name` from the directory
    pub async fn run_one(
        &self,
        connector: &dyn Connector,
        options: &RunOptions,
        name: &str,
    ) -> Result<RunReport, RunFailure> {
        let script = load_script(&self.scripts_dir, name).map_err(|e| RunFailure {
            completed: Vec::new(),
            error: e.into(),
        })?;
        self.run_scripts(connector, options, std::slice::from_ref(&script))
            .await
    }

    async fn run_scripts(
        &self,
        connector: &dyn Connector,
        options: &RunOptions,
        scripts: &[Script],
    ) -> Result<RunReport, RunFailure> {
        let mut db = connector.connect().await.map_err(|e| RunFailure {
            completed: Vec::new(),
            error: MigrateError::Connection(e),
        })?;
        log::debug!("Connected to {} database", db.db_type());

        let mut engine = MigrationEngine::new(self.history_table.as_str());
        let mut completed: Vec<MigrationResult> = Vec::with_capacity(scripts.len());
        let mut failure = None;
        for script in scripts {
            match engine.apply(&mut *db, options, script).await {
                Ok(result) => completed.push(result),
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        close(&mut *db).await;

        if let Some(error) = failure {
            return Err(RunFailure { completed, error });
        }

        let report = RunReport::new(completed);
        if options.output {
            print_report(&report);
        }
        Ok(report)
    }
}

async fn close(db: &mut dyn Database) {
    if let Err(e) = db.close().await {
        log::warn!("Failed to close {} connection: {}", db.db_type(), e);
    }
}

fn print_report(report: &RunReport) {
    for message in report.messages() {
        println!("{}", message);
    }
    if let Some(summary) = report.summary() {
        println!("{}", summary);
    }
}
