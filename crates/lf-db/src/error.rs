//! Error types for lf-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Transaction control error (D003)
    #[error("[D003] Transaction {action} failed: {message}")]
    TransactionError {
        action: &'static str,
        message: String,
    },

    /// Invalid connection string (D004)
    #[error("[D004] Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// Connection already closed (D005)
    #[error("[D005] Database connection is closed")]
    Closed,

    /// Backend not compiled in (D006)
    #[error("[D006] Backend '{0}' is not available in this build")]
    BackendUnavailable(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}

#[cfg(feature = "mssql")]
impl From<tiberius::error::Error> for DbError {
    fn from(err: tiberius::error::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}
