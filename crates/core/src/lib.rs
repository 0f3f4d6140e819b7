//! Tally core data models.
//!
//! Goals, their cadence, and the log entries recorded against them.
//! Period resolution and progress aggregation live in `tally-progress`.

#![warn(missing_docs)]

mod id;
mod date;
mod error;
mod goal;
mod log_entry;

pub use id::{GoalId, LogEntryId};
pub use date::{format_date, parse_date, DATE_FORMAT};
pub use error::CoreError;
pub use goal::{Cadence, Goal, DEFAULT_TARGET_VALUE};
pub use log_entry::{LogEntry, DEFAULT_LOG_VALUE};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
