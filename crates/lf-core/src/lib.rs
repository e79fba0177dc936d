//! lf-core - Core library for Landfall
//!
//! This crate provides migration script discovery and loading, content
//! fingerprinting, and the configuration types shared by the engine and CLI.

pub mod checksum;
pub mod config;
pub mod error;
pub mod history;
pub mod script;

pub use checksum::compute_fingerprint;
pub use config::{Credentials, ProjectConfig, RunOptions, DEFAULT_HISTORY_TABLE};
pub use error::{CoreError, CoreResult};
pub use history::HistoryRecord;
pub use script::{list_scripts, load_script, split_statements, Script};
