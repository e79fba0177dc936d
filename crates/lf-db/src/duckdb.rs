//! DuckDB database backend implementation

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::traits::{Connector, Database};
use crate::value::{format_timestamp, parse_timestamp, SqlValue};
use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::Connection;
use lf_core::HistoryRecord;
use std::path::Path;

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Option<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn: Some(conn) })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", e, path.display())))?;
        Ok(Self { conn: Some(conn) })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn conn(&self) -> DbResult<&Connection> {
        self.conn.as_ref().ok_or(DbError::Closed)
    }

    fn transaction_control(&self, action: &'static str, sql: &str) -> DbResult<()> {
        self.conn()?
            .execute_batch(sql)
            .map_err(|e| DbError::TransactionError {
                action,
                message: e.to_string(),
            })
    }
}

fn to_duckdb_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Int(v) => Value::BigInt(*v),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Timestamp(ts) => Value::Text(format_timestamp(ts)),
    }
}

fn bind_values(params: &[SqlValue]) -> Vec<Value> {
    params.iter().map(to_duckdb_value).collect()
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&mut self, sql: &str) -> DbResult<()> {
        self.conn()?
            .execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    async fn execute_with(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        let affected = self
            .conn()?
            .execute(sql, duckdb::params_from_iter(bind_values(params)))
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?;
        Ok(affected as u64)
    }

    async fn query_history(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> DbResult<Vec<HistoryRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(duckdb::params_from_iter(bind_values(params)), |row| {
            Ok(HistoryRecord {
                id: row.get::<_, i64>(0)?,
                filename: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                fingerprint: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                executed_at: row
                    .get::<_, Option<String>>(3)?
                    .and_then(|s| parse_timestamp(&s)),
                duration_millis: row.get::<_, Option<i64>>(4)?.unwrap_or_default(),
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    async fn relation_exists(&mut self, name: &str) -> DbResult<bool> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            duckdb::params_from_iter([Value::Text(name.to_string())]),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn begin(&mut self) -> DbResult<()> {
        self.transaction_control("begin", "BEGIN TRANSACTION")
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.transaction_control("commit", "COMMIT")
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.transaction_control("rollback", "ROLLBACK")
    }

    async fn close(&mut self) -> DbResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .map_err(|(_, e)| DbError::ConnectionError(e.to_string()))?;
        }
        Ok(())
    }

    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// Opens DuckDB connections to a database file (or `:memory:`)
#[derive(Debug, Clone)]
pub struct DuckDbConnector {
    path: String,
}

impl DuckDbConnector {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Path this connector opens
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl Connector for DuckDbConnector {
    async fn connect(&self) -> DbResult<Box<dyn Database>> {
        Ok(Box::new(DuckDbBackend::new(&self.path)?))
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
