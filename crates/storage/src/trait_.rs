//! Storage trait abstraction.

use async_trait::async_trait;
use chrono::NaiveDate;
use tally_core::{Goal, GoalId, LogEntry, LogEntryId};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data failed validation
    #[error("Invalid record: {0}")]
    Core(#[from] tally_core::CoreError),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for goals and their log entries.
///
/// This trait allows different storage backends to be plugged in.
/// Deleting a goal removes its log entries as well.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Goal operations ===

    /// Save a goal (create or update).
    async fn save_goal(&mut self, goal: &Goal) -> Result<()>;

    /// Load a goal by ID.
    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>>;

    /// List all goals, newest first.
    async fn list_goals(&self) -> Result<Vec<Goal>>;

    /// Delete a goal and all of its log entries.
    ///
    /// Returns `false` when the goal did not exist.
    async fn delete_goal(&mut self, id: GoalId) -> Result<bool>;

    // === Log operations ===

    /// Save a log entry. Fails with [`StorageError::NotFound`] when the
    /// referenced goal does not exist.
    async fn save_log(&mut self, entry: &LogEntry) -> Result<()>;

    /// Load a log entry by ID.
    async fn load_log(&self, id: LogEntryId) -> Result<Option<LogEntry>>;

    /// List a goal's log entries, latest `entry_date` first.
    async fn list_logs(&self, goal_id: GoalId) -> Result<Vec<LogEntry>>;

    /// Delete a log entry. Returns `false` when it did not exist.
    async fn delete_log(&mut self, id: LogEntryId) -> Result<bool>;

    /// Sum `value` over a goal's entries with `entry_date` in `[start, end]`.
    ///
    /// Returns `0` when nothing matches.
    async fn sum_in_range(&self, goal_id: GoalId, start: NaiveDate, end: NaiveDate) -> Result<i64>;
}

/// Ordering used by [`Storage::list_logs`].
/// Sum of `values`, pinned at the `i64` bounds instead of overflowing.
pub(crate) fn saturating_sum(values: impl IntoIterator<Item = i64>) -> i64 {
    values.into_iter().fold(0i64, |acc, v| acc.saturating_add(v))
}

pub(crate) fn sort_logs(logs: &mut [LogEntry]) {
    logs.sort_by(|a, b| {
        b.entry_date
            .cmp(&a.entry_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
