//! Log entry model - one progress event against a goal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::id::{GoalId, LogEntryId};
use crate::Time;

/// Default value of a log entry when none is given.
pub const DEFAULT_LOG_VALUE: i64 = 1;

/// A single logged amount of progress on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique identifier
    pub id: LogEntryId,

    /// Goal this entry counts towards
    pub goal_id: GoalId,

    /// Calendar day the progress belongs to
    pub entry_date: NaiveDate,

    /// Amount logged. Negative values are allowed and reduce the total.
    #[serde(default = "default_log_value")]
    pub value: i64,

    /// Free-form note
    #[serde(default)]
    pub note: Option<String>,

    /// When created
    pub created_at: Time,
}

fn default_log_value() -> i64 {
    DEFAULT_LOG_VALUE
}

impl LogEntry {
    /// Create a new entry for `entry_date` with the default value.
    ///
    /// Callers that accept an optional date pass their own "today" here.
    pub fn new(goal_id: GoalId, entry_date: NaiveDate) -> Self {
        Self {
            id: LogEntryId::new(),
            goal_id,
            entry_date,
            value: DEFAULT_LOG_VALUE,
            note: None,
            created_at: chrono::Utc::now(),
        }
    }

    /// Set the logged amount.
    pub fn with_value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }

    /// Attach a note. Blank text clears it.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = if note.trim().is_empty() { None } else { Some(note) };
        self
    }
}
