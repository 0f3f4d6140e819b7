//! Period resolution and progress aggregation.
//!
//! Resolves the current daily, weekly or monthly window for a goal and
//! turns the logged total inside it into a bounded percentage.

#![warn(missing_docs)]

pub mod period;
pub mod aggregator;
pub mod tracker;

pub use period::{resolve, resolve_at, PeriodWindow};
pub use aggregator::{compute_stats, progress_percent, LogSumProvider, StatsResult};
pub use tracker::{GoalStats, ProgressSnapshot, ProgressTracker};
