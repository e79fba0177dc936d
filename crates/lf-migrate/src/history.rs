//! The migration history table.
//!
//! [`HistoryStore`] owns every statement that touches the table. It caches
//! whether the table exists for the lifetime of one run, and in preview mode
//! treats a missing table as an empty history instead of creating it.

use crate::error::{MigrateError, MigrateResult};
use chrono::NaiveDateTime;
use lf_core::HistoryRecord;
use lf_db::{Database, DbError, Dialect, SqlValue};

const COL_ID: &str = "Id";
const COL_FILENAME: &str = "Filename";
const COL_HASH: &str = "Hash";
const COL_EXECUTION_DATE: &str = "ExecutionDate";
const COL_DURATION: &str = "Duration";

/// What is known about the history table during this run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// Not checked yet
    Unknown,
    /// Exists (found or created)
    Present,
    /// Missing, and left missing because the run is a preview
    Absent,
}

/// How a successful script is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWrite {
    /// First application of this filename
    Insert,
    /// Forced re-application over an existing row for this filename.
    ///
    /// Matches rows by `Filename` only. A rename can leave two rows under one
    /// filename (the renamed script's row plus an older row for that name);
    /// this update then writes the same fingerprint into both, so the
    /// one-row-per-fingerprint guarantee does not hold for that table.
    Update,
}

/// A history row about to be written
#[derive(Debug, Clone)]
pub struct NewHistoryRecord<'a> {
    pub filename: &'a str,
    pub fingerprint: &'a str,
    pub executed_at: NaiveDateTime,
    pub duration_millis: i64,
}

/// Access to the migration history table for one run
#[derive(Debug)]
pub struct HistoryStore {
    table: String,
    state: TableState,
}

impl HistoryStore {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            state: TableState::Unknown,
        }
    }

    /// Name of the history table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Cached table state
    pub fn state(&self) -> TableState {
        self.state
    }

    /// Whether lookups and writes are simulated against an empty history
    fn simulated(&self) -> bool {
        self.state == TableState::Absent
    }

    fn err(&self, action: &'static str) -> impl FnOnce(DbError) -> MigrateError + '_ {
        move |source| MigrateError::History {
            action,
            table: self.table.clone(),
            source,
        }
    }

    /// Make sure the history table exists, returning whether it does.
    ///
    /// In preview mode a missing table is reported and left missing.
    pub async fn ensure_table(
        &mut self,
        db: &mut dyn Database,
        preview: bool,
    ) -> MigrateResult<bool> {
        match self.state {
            TableState::Present => return Ok(true),
            TableState::Absent if preview => return Ok(false),
            _ => {}
        }

        if db
            .relation_exists(&self.table)
            .await
            .map_err(self.err("lookup"))?
        {
            self.state = TableState::Present;
            return Ok(true);
        }

        if preview {
            log::debug!(
                "History table {} does not exist; preview leaves it absent",
                self.table
            );
            self.state = TableState::Absent;
            return Ok(false);
        }

        log::info!("Creating history table {}", self.table);
        for sql in create_table_sql(db.dialect(), &self.table) {
            db.execute(&sql).await.map_err(self.err("create"))?;
        }
        self.state = TableState::Present;
        Ok(true)
    }

    /// Find the record for a content fingerprint
    pub async fn find_by_fingerprint(
        &self,
        db: &mut dyn Database,
        fingerprint: &str,
    ) -> MigrateResult<Option<HistoryRecord>> {
        self.find_one(db, COL_HASH, fingerprint).await
    }

    /// Find a record for a filename
    pub async fn find_by_filename(
        &self,
        db: &mut dyn Database,
        filename: &str,
    ) -> MigrateResult<Option<HistoryRecord>> {
        self.find_one(db, COL_FILENAME, filename).await
    }

    async fn find_one(
        &self,
        db: &mut dyn Database,
        column: &str,
        value: &str,
    ) -> MigrateResult<Option<HistoryRecord>> {
        if self.simulated() {
            return Ok(None);
        }

        let dialect = db.dialect();
        let predicate = format!(
            "{} = {}",
            dialect.quote_ident(column),
            dialect.placeholder(1)
        );
        let sql = dialect.select_first(
            &select_list(dialect),
            &dialect.quote_ident(&self.table),
            &predicate,
        );

        let mut rows = db
            .query_history(&sql, &[SqlValue::from(value)])
            .await
            .map_err(self.err("lookup"))?;
        Ok(rows.pop())
    }

    /// Record a successful application.
    ///
    /// `Insert` adds a row; `Update` overwrites the hash, date, and duration of
    /// the row recorded under the same filename.
    pub async fn upsert(
        &self,
        db: &mut dyn Database,
        record: &NewHistoryRecord<'_>,
        write: HistoryWrite,
    ) -> MigrateResult<()> {
        if self.simulated() {
            return Ok(());
        }

        let d = db.dialect();
        let table = d.quote_ident(&self.table);
        let sql = match write {
            HistoryWrite::Insert => format!(
                "INSERT INTO {} ({}, {}, {}, {}) VALUES ({}, {}, {}, {})",
                table,
                d.quote_ident(COL_HASH),
                d.quote_ident(COL_EXECUTION_DATE),
                d.quote_ident(COL_DURATION),
                d.quote_ident(COL_FILENAME),
                d.placeholder(1),
                d.timestamp_placeholder(2),
                d.placeholder(3),
                d.placeholder(4),
            ),
            HistoryWrite::Update => format!(
                "UPDATE {} SET {} = {}, {} = {}, {} = {} WHERE {} = {}",
                table,
                d.quote_ident(COL_HASH),
                d.placeholder(1),
                d.quote_ident(COL_EXECUTION_DATE),
                d.timestamp_placeholder(2),
                d.quote_ident(COL_DURATION),
                d.placeholder(3),
                d.quote_ident(COL_FILENAME),
                d.placeholder(4),
            ),
        };
        let params = [
            SqlValue::from(record.fingerprint),
            SqlValue::Timestamp(record.executed_at),
            SqlValue::Int(record.duration_millis),
            SqlValue::from(record.filename),
        ];

        db.execute_with(&sql, &params)
            .await
            .map_err(self.err("write"))?;
        Ok(())
    }

    /// Point the record for `fingerprint` at a new filename
    pub async fn rename_filename(
        &self,
        db: &mut dyn Database,
        fingerprint: &str,
        new_name: &str,
    ) -> MigrateResult<()> {
        if self.simulated() {
            return Ok(());
        }

        let d = db.dialect();
        let sql = format!(
            "UPDATE {} SET {} = {} WHERE {} = {}",
            d.quote_ident(&self.table),
            d.quote_ident(COL_FILENAME),
            d.placeholder(1),
            d.quote_ident(COL_HASH),
            d.placeholder(2),
        );
        let params = [SqlValue::from(new_name), SqlValue::from(fingerprint)];
        db.execute_with(&sql, &params)
            .await
            .map_err(self.err("rename"))?;
        Ok(())
    }
}

fn select_list(d: Dialect) -> String {
    [
        d.quote_ident(COL_ID),
        d.quote_ident(COL_FILENAME),
        d.quote_ident(COL_HASH),
        d.select_timestamp(COL_EXECUTION_DATE),
        d.quote_ident(COL_DURATION),
    ]
    .join(", ")
}

/// Sequence backing the DuckDB `Id` column, reduced to a bare identifier.
fn sequence_name(table: &str) -> String {
    let base: String = table
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_id_seq", base)
}

/// Statements that create the history table.
fn create_table_sql(d: Dialect, table: &str) -> Vec<String> {
    match d {
        Dialect::SqlServer => vec![format!(
            "CREATE TABLE {}(\
             [Id] [int] IDENTITY(1,1) NOT NULL, \
             [Filename] [nvarchar](260) NULL, \
             [Hash] [varchar](40) NULL, \
             [ExecutionDate] [datetime] NULL, \
             [Duration] [int] NULL, \
             PRIMARY KEY CLUSTERED ([Id] ASC)\
             )",
            d.quote_ident(table)
        )],
        Dialect::DuckDb => {
            // No IDENTITY in DuckDB; a per-table sequence supplies the ids.
            let sequence = sequence_name(table);
            vec![
                format!("CREATE SEQUENCE IF NOT EXISTS {}", sequence),
                format!(
                    "CREATE TABLE {} (\
                     \"Id\" BIGINT PRIMARY KEY DEFAULT nextval('{}'), \
                     \"Filename\" VARCHAR(260), \
                     \"Hash\" VARCHAR(40), \
                     \"ExecutionDate\" TIMESTAMP, \
                     \"Duration\" BIGINT\
                     )",
                    d.quote_ident(table),
                    sequence
                ),
            ]
        }
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
