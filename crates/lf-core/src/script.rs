//! Migration script discovery and loading.
//!
//! Scripts are `*.sql` files directly inside the scripts directory. Their
//! filenames are both the execution order and the descriptive identity stored
//! in the history table; their content fingerprint is the durable identity.

use crate::checksum::compute_fingerprint;
use crate::error::{CoreError, CoreResult};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// File extension recognised as a migration script.
pub const SCRIPT_EXTENSION: &str = ".sql";

static BATCH_SEPARATOR: OnceLock<Regex> = OnceLock::new();

/// Line-anchored `GO` separator, matched case-insensitively on every line.
fn batch_separator() -> &'static Regex {
    BATCH_SEPARATOR.get_or_init(|| Regex::new(r"(?im)^\s*GO\s*$").expect("valid regex"))
}

/// A migration script loaded from disk.
///
/// Immutable once built: the fingerprint is always computed over the exact
/// text the statements were split from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    name: String,
    fingerprint: String,
    statements: Vec<String>,
}

impl Script {
    /// Build a script from its filename and raw SQL text.
    pub fn from_sql(name: impl Into<String>, sql: &str) -> Self {
        Self {
            name: name.into(),
            fingerprint: compute_fingerprint(sql),
            statements: split_statements(sql),
        }
    }

    /// Filename of the script (also its sort key)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content fingerprint of the raw file
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Statement blocks in file order, untrimmed
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Whether the script has no executable statements
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Split SQL text on `GO` separator lines.
///
/// Blocks that are empty or whitespace-only are dropped; the remaining blocks
/// are returned verbatim.
pub fn split_statements(sql: &str) -> Vec<String> {
    batch_separator()
        .split(sql)
        .filter(|block| !block.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `name` looks like a migration script filename.
///
/// Requires at least one character before the `.sql` extension.
pub fn is_script_name(name: &str) -> bool {
    name.len() > SCRIPT_EXTENSION.len() && name.ends_with(SCRIPT_EXTENSION)
}

/// Load a single script by filename from `dir`.
pub fn load_script(dir: &Path, name: &str) -> CoreResult<Script> {
    let path = dir.join(name);
    let sql = std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(Script::from_sql(name, &sql))
}

/// List every migration script in `dir`, ordered by filename.
///
/// Names are compared byte-wise so the order does not depend on the platform's
/// directory listing. Scripts without any statements are left out entirely.
pub fn list_scripts(dir: &Path) -> CoreResult<Vec<Script>> {
    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::ScriptDirectory {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CoreError::ScriptDirectory {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if is_script_name(&name) => names.push(name),
            Ok(_) => {}
            Err(raw) => log::warn!("Ignoring non UTF-8 filename: {}", raw.to_string_lossy()),
        }
    }
    names.sort();

    let mut scripts = Vec::with_capacity(names.len());
    for name in &names {
        let script = load_script(dir, name)?;
        if script.is_empty() {
            log::debug!("Skipping {}: no statements", name);
            continue;
        }
        scripts.push(script);
    }
    Ok(scripts)
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
