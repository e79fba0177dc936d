//! SQL dialect differences that matter to the history table.

/// SQL dialect spoken by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Microsoft SQL Server (T-SQL)
    SqlServer,
    /// DuckDB, used for local rehearsals and tests
    DuckDb,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::SqlServer => write!(f, "sqlserver"),
            Dialect::DuckDb => write!(f, "duckdb"),
        }
    }
}

impl Dialect {
    /// Quote an identifier, escaping embedded closing quotes.
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Dialect::SqlServer => format!("[{}]", ident.replace(']', "]]")),
            Dialect::DuckDb => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::SqlServer => format!("@P{}", index),
            Dialect::DuckDb => "?".to_string(),
        }
    }

    /// Placeholder for a timestamp parameter.
    ///
    /// DuckDB receives timestamps as text and needs an explicit cast.
    pub fn timestamp_placeholder(&self, index: usize) -> String {
        match self {
            Dialect::SqlServer => self.placeholder(index),
            Dialect::DuckDb => format!("CAST({} AS TIMESTAMP)", self.placeholder(index)),
        }
    }

    /// Select-list expression for a timestamp column.
    pub fn select_timestamp(&self, column: &str) -> String {
        match self {
            Dialect::SqlServer => self.quote_ident(column),
            Dialect::DuckDb => format!("CAST({} AS VARCHAR)", self.quote_ident(column)),
        }
    }

    /// Build a query returning at most one row.
    pub fn select_first(&self, columns: &str, table: &str, predicate: &str) -> String {
        match self {
            Dialect::SqlServer => {
                format!("SELECT TOP 1 {} FROM {} WHERE {}", columns, table, predicate)
            }
            Dialect::DuckDb => {
                format!("SELECT {} FROM {} WHERE {} LIMIT 1", columns, table, predicate)
            }
        }
    }
}
