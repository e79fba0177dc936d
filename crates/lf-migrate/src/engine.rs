//! Applies one migration script.
//!
//! Each script moves through the same steps: ensure the history table,
//! look the script up by fingerprint and then by filename, and, if it is
//! pending, run its statements and record it inside one transaction. A script
//! either lands completely (statements plus history row) or not at all.

use crate::error::{MigrateError, MigrateResult};
use crate::history::{HistoryStore, HistoryWrite, NewHistoryRecord};
use crate::result::MigrationResult;
use chrono::Utc;
use lf_core::{RunOptions, Script};
use lf_db::Database;
use std::time::Instant;

/// Where a script stands against the recorded history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Same content already applied under the same filename
    Applied,
    /// Same content already applied under another filename
    Renamed { from: String },
    /// Not applied yet; carries how the history row will be written
    Pending(HistoryWrite),
}

/// The open transaction of one script.
///
/// Holds the connection exclusively until the transaction is committed,
/// rolled back, or aborted.
struct ScriptTransaction<'a> {
    db: &'a mut dyn Database,
    script: &'a str,
}

impl<'a> ScriptTransaction<'a> {
    async fn begin(db: &'a mut dyn Database, script: &'a str) -> MigrateResult<Self> {
        // A failed BEGIN leaves nothing to roll back.
        db.begin()
            .await
            .map_err(|source| MigrateError::Transaction {
                action: "begin",
                script: script.to_string(),
                source,
            })?;
        Ok(Self { db, script })
    }

    fn db(&mut self) -> &mut dyn Database {
        &mut *self.db
    }

    async fn commit(self) -> MigrateResult<()> {
        match self.db.commit().await {
            Ok(()) => Ok(()),
            Err(source) => {
                let err = MigrateError::Transaction {
                    action: "commit",
                    script: self.script.to_string(),
                    source,
                };
                Err(self.abort(err).await)
            }
        }
    }

    async fn rollback(self) -> MigrateResult<()> {
        self.db
            .rollback()
            .await
            .map_err(|source| MigrateError::Transaction {
                action: "rollback",
                script: self.script.to_string(),
                source,
            })
    }

    /// Roll back after `err`, chaining a rollback failure onto it.
    async fn abort(self, err: MigrateError) -> MigrateError {
        match self.db.rollback().await {
            Ok(()) => err,
            Err(rollback) => MigrateError::RollbackFailed {
                original: Box::new(err),
                rollback,
            },
        }
    }
}

/// Applies scripts against one connection, tracking them in the history table
#[derive(Debug)]
pub struct MigrationEngine {
    history: HistoryStore,
}

impl MigrationEngine {
    /// Create an engine recording into `history_table`
    pub fn new(history_table: impl Into<String>) -> Self {
        Self {
            history: HistoryStore::new(history_table),
        }
    }

    /// The history store used by this engine
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Apply `script` unless its content is already recorded.
    ///
    /// In preview mode the statements still run (to validate them) but the
    /// transaction is always rolled back, and a missing history table is
    /// never created.
    pub async fn apply(
        &mut self,
        db: &mut dyn Database,
        options: &RunOptions,
        script: &Script,
    ) -> MigrateResult<MigrationResult> {
        self.history.ensure_table(db, options.preview).await?;

        let write = match self.lookup(db, options, script).await? {
            Lookup::Applied => {
                log::debug!("{} already applied", script.name());
                return Ok(MigrationResult::skipped(script.name()));
            }
            Lookup::Renamed { from } => {
                log::info!("{} was applied as {}", script.name(), from);
                if !options.preview {
                    self.history
                        .rename_filename(db, script.fingerprint(), script.name())
                        .await?;
                }
                let mut result = MigrationResult::skipped(script.name());
                result.message = format!(
                    "Filename has changed in the database; updating {}",
                    script.name()
                );
                return Ok(result);
            }
            Lookup::Pending(write) => write,
        };

        let mut tx = ScriptTransaction::begin(db, script.name()).await?;
        let duration_millis = match self.execute_and_record(&mut tx, script, write).await {
            Ok(duration) => duration,
            Err(err) => return Err(tx.abort(err).await),
        };

        if options.preview {
            tx.rollback().await?;
        } else {
            tx.commit().await?;
        }

        log::info!("Migrated {} in {}ms", script.name(), duration_millis);
        Ok(MigrationResult::applied(script.name(), duration_millis))
    }

    /// Classify `script` against the recorded history.
    ///
    /// Fails with `AlreadyMigrated` when the filename was recorded with other
    /// content and `force` is not set.
    pub async fn lookup(
        &self,
        db: &mut dyn Database,
        options: &RunOptions,
        script: &Script,
    ) -> MigrateResult<Lookup> {
        if let Some(applied) = self
            .history
            .find_by_fingerprint(db, script.fingerprint())
            .await?
        {
            if applied.filename == script.name() {
                return Ok(Lookup::Applied);
            }
            return Ok(Lookup::Renamed {
                from: applied.filename,
            });
        }

        if self
            .history
            .find_by_filename(db, script.name())
            .await?
            .is_none()
        {
            return Ok(Lookup::Pending(HistoryWrite::Insert));
        }

        if !options.force {
            return Err(MigrateError::AlreadyMigrated {
                script: script.name().to_string(),
                fingerprint: script.fingerprint().to_string(),
            });
        }
        log::warn!("Forcing re-application of {}", script.name());
        Ok(Lookup::Pending(HistoryWrite::Update))
    }

    /// Run every statement, then write the history row on the same
    /// transaction. Returns the statement time in milliseconds.
    async fn execute_and_record(
        &self,
        tx: &mut ScriptTransaction<'_>,
        script: &Script,
        write: HistoryWrite,
    ) -> MigrateResult<i64> {
        let start = Instant::now();
        for (index, statement) in script.statements().iter().enumerate() {
            let sql = statement.trim();
            if sql.is_empty() {
                continue;
            }
            tx.db()
                .execute(sql)
                .await
                .map_err(|source| MigrateError::StatementExecution {
                    script: script.name().to_string(),
                    fingerprint: script.fingerprint().to_string(),
                    statement: index + 1,
                    source,
                })?;
        }
        let duration_millis = (start.elapsed().as_secs_f64() * 1000.0).round() as i64;
        log::debug!(
            "Ran {} statement(s) of {}",
            script.statements().len(),
            script.name()
        );

        let record = NewHistoryRecord {
            filename: script.name(),
            fingerprint: script.fingerprint(),
            executed_at: Utc::now().naive_utc(),
            duration_millis,
        };
        self.history.upsert(tx.db(), &record, write).await?;
        Ok(duration_millis)
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
