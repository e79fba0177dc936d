//! Database trait definitions

use crate::dialect::Dialect;
use crate::error::DbResult;
use crate::value::SqlValue;
use async_trait::async_trait;
use lf_core::HistoryRecord;

/// A single open database connection.
///
/// Methods take `&mut self`: a connection is driven by one caller at a time,
/// and statements issued between `begin` and `commit`/`rollback` belong to
/// that transaction.
#[async_trait]
pub trait Database: Send {
    /// Execute a raw SQL batch with no parameters
    async fn execute(&mut self, sql: &str) -> DbResult<()>;

    /// Execute a parameterized statement, returning affected rows
    async fn execute_with(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<u64>;

    /// Run a query selecting `Id, Filename, Hash, ExecutionDate, Duration`
    /// (in that order) and map each row to a [`HistoryRecord`]
    async fn query_history(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> DbResult<Vec<HistoryRecord>>;

    /// Check whether a table with this name exists
    async fn relation_exists(&mut self, name: &str) -> DbResult<bool>;

    /// Begin a transaction
    async fn begin(&mut self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&mut self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&mut self) -> DbResult<()>;

    /// Close the connection; later calls fail with `DbError::Closed`
    async fn close(&mut self) -> DbResult<()>;

    /// SQL dialect spoken by this connection
    fn dialect(&self) -> Dialect;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Opens fresh connections to one target database.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open and authenticate a new connection
    async fn connect(&self) -> DbResult<Box<dyn Database>>;
}
