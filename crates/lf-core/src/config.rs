//! Configuration types: `landfall.yml`, credentials files, and run options.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the migration history table
pub const DEFAULT_HISTORY_TABLE: &str = "Migrations";

/// Default project config filename
pub const CONFIG_FILENAME: &str = "landfall.yml";

/// Options that shape a single migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Re-apply a script whose filename was recorded with different content
    pub force: bool,

    /// Classify and validate scripts without committing anything
    pub preview: bool,

    /// Emit per-script messages and the skipped summary
    pub output: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            force: false,
            preview: false,
            output: true,
        }
    }
}

/// Project configuration from landfall.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Directory containing the migration scripts
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,

    /// Name of the history table
    #[serde(default = "default_history_table")]
    pub history_table: String,

    /// Inline connection string
    #[serde(default)]
    pub connection: Option<String>,

    /// Path to a JSON credentials file holding the connection string
    #[serde(default)]
    pub credentials_file: Option<String>,
}

fn default_scripts_dir() -> String {
    "migrations".to_string()
}

fn default_history_table() -> String {
    DEFAULT_HISTORY_TABLE.to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            history_table: default_history_table(),
            connection: None,
            credentials_file: None,
        }
    }
}

impl ProjectConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: ProjectConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `landfall.yml` from `dir`, falling back to defaults when absent
    pub fn load_from_dir_or_default(dir: &Path) -> CoreResult<Self> {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Scripts directory resolved against `root` when relative
    pub fn scripts_dir_absolute(&self, root: &Path) -> PathBuf {
        let dir = Path::new(&self.scripts_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            root.join(dir)
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.history_table.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "history_table cannot be empty".to_string(),
            });
        }
        if self.scripts_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "scripts_dir cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// JSON credentials file: `{ "connectionString": "..." }`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub connection_string: Option<String>,
}

impl Credentials {
    /// Read a credentials file and return its connection string
    pub fn load_connection_string(path: &Path) -> CoreResult<String> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let creds: Credentials = serde_json::from_str(&content)?;
        creds
            .connection_string
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| CoreError::MissingConnectionString {
                path: path.display().to_string(),
            })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
