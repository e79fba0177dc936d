//! Per-script outcomes and batch summaries

/// Outcome of applying (or skipping) one script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    /// Script filename
    pub name: String,

    /// True when the script's content was already applied
    pub skipped: bool,

    /// Statement execution time in milliseconds (0 when skipped)
    pub duration_millis: i64,

    /// Human-readable summary, empty when there is nothing to report
    pub message: String,
}

impl MigrationResult {
    /// A result for a script that was not executed
    pub fn skipped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            skipped: true,
            duration_millis: 0,
            message: String::new(),
        }
    }

    /// A result for a script whose statements ran
    pub fn applied(name: &str, duration_millis: i64) -> Self {
        Self {
            name: name.to_string(),
            skipped: false,
            duration_millis,
            message: format!("Successfully migrated {}", name),
        }
    }
}

/// Results of a complete batch run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// One result per script, in execution order
    pub results: Vec<MigrationResult>,
}

impl RunReport {
    pub fn new(results: Vec<MigrationResult>) -> Self {
        Self { results }
    }

    /// Number of scripts that were already applied
    pub fn skipped_count(&self) -> usize {
        self.results.iter().filter(|r| r.skipped).count()
    }

    /// Number of scripts whose statements ran
    pub fn applied_count(&self) -> usize {
        self.results.len() - self.skipped_count()
    }

    /// Non-empty result messages, in order
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .map(|r| r.message.as_str())
            .filter(|m| !m.is_empty())
    }

    /// Trailing summary line, present only when something was skipped
    pub fn summary(&self) -> Option<String> {
        match self.skipped_count() {
            0 => None,
            n => Some(format!("{} previously applied migrations were skipped.", n)),
        }
    }
}
