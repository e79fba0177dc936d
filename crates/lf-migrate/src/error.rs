//! Error types for lf-migrate

use crate::result::MigrationResult;
use lf_core::CoreError;
use lf_db::DbError;
use thiserror::Error;

/// Migration errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Script directory or file could not be read (M001)
    #[error("[M001] Failed to load migration scripts")]
    Scripts(#[from] CoreError),

    /// Could not open or authenticate the connection (M002)
    #[error("[M002] Failed to connect to the database")]
    Connection(#[source] DbError),

    /// Filename already applied with different content (M003)
    #[error("[M003] Failed to migrate: {script} (Hash: {fingerprint}) - the file was already migrated in the past, to force migration use the --force option")]
    AlreadyMigrated { script: String, fingerprint: String },

    /// A statement inside the script's transaction failed (M004)
    #[error("[M004] Statement {statement} of {script} (Hash: {fingerprint}) failed")]
    StatementExecution {
        script: String,
        fingerprint: String,
        statement: usize,
        #[source]
        source: DbError,
    },

    /// Reading or writing the history table failed (M005)
    #[error("[M005] History table {action} failed for {table}")]
    History {
        action: &'static str,
        table: String,
        #[source]
        source: DbError,
    },

    /// BEGIN, COMMIT, or ROLLBACK failed (M006)
    #[error("[M006] Could not {action} the transaction for {script}")]
    Transaction {
        action: &'static str,
        script: String,
        #[source]
        source: DbError,
    },

    /// Rolling back after a failure also failed (M007)
    #[error("[M007] Rollback failed after an earlier error: {rollback}")]
    RollbackFailed {
        #[source]
        original: Box<MigrateError>,
        rollback: DbError,
    },
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

/// A batch run that stopped on a hard failure.
///
/// Scripts that completed before the failure stay committed; their results
/// are kept in `completed`.
#[derive(Error, Debug)]
#[error("Migration run stopped after {} completed script(s)", .completed.len())]
pub struct RunFailure {
    pub completed: Vec<MigrationResult>,
    #[source]
    pub error: MigrateError,
}
