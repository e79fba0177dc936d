//! Error types for lf-core

use thiserror::Error;

/// Core error type for Landfall
#[derive(Error, Debug)]
pub enum CoreError {
    /// L001: Configuration file not found
    #[error("[L001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// L002: Invalid configuration value
    #[error("[L002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// L003: Script directory could not be listed
    #[error("[L003] Failed to read script directory '{path}': {source}")]
    ScriptDirectory {
        path: String,
        source: std::io::Error,
    },

    /// L004: IO error with file path context
    #[error("[L004] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// L005: Credentials file has no usable connection string
    #[error("[L005] Credentials file '{path}' does not contain a connection string")]
    MissingConnectionString { path: String },

    /// L006: YAML parse error
    #[error("[L006] Config parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// L007: JSON parse error
    #[error("[L007] Credentials parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
