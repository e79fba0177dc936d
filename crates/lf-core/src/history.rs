//! Rows of the migration history table.

use chrono::NaiveDateTime;

/// One applied migration as recorded in the history table.
///
/// The fingerprint identifies the migration; the filename is descriptive and
/// is corrected when a script is renamed without changing its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    /// Surrogate key assigned by the database
    pub id: i64,

    /// Script filename at the time it was applied (or last renamed)
    pub filename: String,

    /// Content fingerprint of the applied script
    pub fingerprint: String,

    /// When the script was applied
    pub executed_at: Option<NaiveDateTime>,

    /// How long the statements took, in milliseconds
    pub duration_millis: i64,
}
