//! lf-migrate - Migration engine for Landfall
//!
//! Applies SQL scripts exactly once each, recording every applied script's
//! content fingerprint in a history table.

pub mod engine;
pub mod error;
pub mod history;
pub mod result;
pub mod runner;

pub use engine::{Lookup, MigrationEngine};
pub use error::{MigrateError, MigrateResult, RunFailure};
pub use history::{HistoryStore, HistoryWrite, NewHistoryRecord, TableState};
pub use result::{MigrationResult, RunReport};
pub use runner::MigrationRunner;
