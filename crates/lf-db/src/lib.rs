//! lf-db - Database abstraction layer for Landfall
//!
//! This crate provides the `Database` and `Connector` traits, a DuckDB
//! implementation used for local rehearsals and tests, and a SQL Server
//! implementation behind the `mssql` feature.

pub mod connection_string;
pub mod dialect;
pub mod duckdb;
pub mod error;
#[cfg(feature = "mssql")]
pub mod mssql;
pub mod traits;
pub mod value;

pub use connection_string::{ConnectionSettings, ConnectionString};
pub use dialect::Dialect;
pub use duckdb::{DuckDbBackend, DuckDbConnector};
pub use error::{DbError, DbResult};
#[cfg(feature = "mssql")]
pub use mssql::{MssqlBackend, MssqlConnector};
pub use traits::{Connector, Database};
pub use value::SqlValue;
