//! Progress aggregation for a single goal.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tally_core::{Goal, GoalId};
use tally_storage::{Storage, StorageError};
use tracing::debug;

use crate::period::{resolve, PeriodWindow};

/// Source of per-goal log totals.
///
/// Implementations sum `value` over a goal's entries whose `entry_date`
/// lies in `[start, end]` and return `0` when nothing matches.
#[async_trait]
pub trait LogSumProvider: Send + Sync {
    /// Error surfaced unchanged by [`compute_stats`].
    type Error: Send;

    /// Sum logged values for `goal_id` between `start` and `end`, inclusive.
    async fn sum_in_range(
        &self,
        goal_id: GoalId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, Self::Error>;
}

#[async_trait]
impl<S: Storage + ?Sized> LogSumProvider for S {
    type Error = StorageError;

    async fn sum_in_range(
        &self,
        goal_id: GoalId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, StorageError> {
        Storage::sum_in_range(self, goal_id, start, end).await
    }
}

/// Progress of one goal in its current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResult {
    /// First day of the current period
    pub period_start: NaiveDate,
    /// Last day of the current period
    pub period_end: NaiveDate,
    /// Logged total over target, as a whole percentage in `0..=100`
    pub progress_percent: u8,
}

impl StatsResult {
    /// The period these stats cover.
    pub fn window(&self) -> PeriodWindow {
        PeriodWindow {
            start: self.period_start,
            end: self.period_end,
        }
    }
}

/// Compute `goal`'s progress for the period containing `now`.
///
/// Performs exactly one read through `provider`. Provider errors are
/// returned as-is.
pub async fn compute_stats<P>(
    goal: &Goal,
    provider: &P,
    now: NaiveDateTime,
) -> Result<StatsResult, P::Error>
where
    P: LogSumProvider + ?Sized,
{
    let window = resolve(goal.cadence, now.date());
    let total = provider.sum_in_range(goal.id, window.start, window.end).await?;
    let progress_percent = progress_percent(total, goal.target_value);

    debug!(
        "Goal {} ({}) {}..={} total={} target={} progress={}%",
        goal.id, goal.cadence, window.start, window.end, total, goal.target_value, progress_percent
    );

    Ok(StatsResult {
        period_start: window.start,
        period_end: window.end,
        progress_percent,
    })
}

/// Whole percentage of `target` reached by `total`, clamped to `0..=100`.
///
/// Targets below 1 count as 1. Halves round away from zero.
pub fn progress_percent(total: i64, target: i64) -> u8 {
    let denominator = target.max(1) as f64;
    let percent = (total as f64 / denominator * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tally_core::{Cadence, LogEntry};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        day(y, m, d).and_hms_opt(12, 0, 0).unwrap()
    }

    /// Sums over a fixed list of entries and counts reads.
    struct FakeLogs {
        entries: Vec<LogEntry>,
        reads: AtomicUsize,
    }

    impl FakeLogs {
        fn new(entries: Vec<LogEntry>) -> Self {
            Self {
                entries,
                reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LogSumProvider for FakeLogs {
        type Error = String;

        async fn sum_in_range(
            &self,
            goal_id: GoalId,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<i64, String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .entries
                .iter()
                .filter(|e| e.goal_id == goal_id && e.entry_date >= start && e.entry_date <= end)
                .map(|e| e.value)
                .sum())
        }
    }

    /// Returns canned sums keyed by the exact window requested.
    struct FixedSums(HashMap<(GoalId, NaiveDate, NaiveDate), i64>);

    #[async_trait]
    impl LogSumProvider for FixedSums {
        type Error = String;

        async fn sum_in_range(
            &self,
            goal_id: GoalId,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<i64, String> {
            Ok(self.0.get(&(goal_id, start, end)).copied().unwrap_or(0))
        }
    }

    struct Unreachable;

    #[async_trait]
    impl LogSumProvider for Unreachable {
        type Error = String;

        async fn sum_in_range(&self, _: GoalId, _: NaiveDate, _: NaiveDate) -> Result<i64, String> {
            Err("store unreachable".to_string())
        }
    }

    fn goal(cadence: Cadence, target: i64) -> Goal {
        Goal::new("Test goal", cadence).unwrap().with_target_value(target)
    }

    #[test]
    fn test_progress_percent_clamps_and_rounds() {
        assert_eq!(progress_percent(0, 5), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 8), 13); // 12.5 rounds up
        assert_eq!(progress_percent(5, 5), 100);
        assert_eq!(progress_percent(50, 5), 100);
        assert_eq!(progress_percent(i64::MAX, 1), 100);
        assert_eq!(progress_percent(-4, 5), 0);
    }

    #[test]
    fn test_degenerate_target_counts_as_one() {
        assert_eq!(progress_percent(1, 0), progress_percent(1, 1));
        assert_eq!(progress_percent(1, -7), 100);
        assert_eq!(progress_percent(0, 0), 0);
    }

    #[tokio::test]
    async fn test_daily_goal_met() {
        let goal = goal(Cadence::Daily, 2);
        let logs = FakeLogs::new(vec![
            LogEntry::new(goal.id, day(2024, 3, 10)),
            LogEntry::new(goal.id, day(2024, 3, 10)),
        ]);

        let stats = compute_stats(&goal, &logs, noon(2024, 3, 10)).await.unwrap();
        assert_eq!(stats.period_start, day(2024, 3, 10));
        assert_eq!(stats.period_end, day(2024, 3, 10));
        assert_eq!(stats.progress_percent, 100);
        assert_eq!(logs.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_weekly_excludes_previous_saturday() {
        let goal = goal(Cadence::Weekly, 5);
        let logs = FakeLogs::new(vec![
            LogEntry::new(goal.id, day(2024, 3, 3)).with_value(5),
            LogEntry::new(goal.id, day(2024, 3, 4)),
            LogEntry::new(goal.id, day(2024, 3, 10)),
        ]);

        let stats = compute_stats(&goal, &logs, noon(2024, 3, 10)).await.unwrap();
        assert_eq!(stats.period_start, day(2024, 3, 4));
        assert_eq!(stats.period_end, day(2024, 3, 10));
        assert_eq!(stats.progress_percent, 40);
    }

    #[tokio::test]
    async fn test_other_goals_do_not_count() {
        let goal = goal(Cadence::Monthly, 4);
        let other = GoalId::new();
        let logs = FakeLogs::new(vec![
            LogEntry::new(other, day(2024, 2, 14)).with_value(4),
            LogEntry::new(goal.id, day(2024, 2, 29)),
        ]);

        let stats = compute_stats(&goal, &logs, noon(2024, 2, 15)).await.unwrap();
        assert_eq!(stats.period_end, day(2024, 2, 29));
        assert_eq!(stats.progress_percent, 25);
    }

    #[tokio::test]
    async fn test_no_entries_is_zero() {
        let goal = goal(Cadence::Weekly, 3);
        let stats = compute_stats(&goal, &FakeLogs::new(Vec::new()), noon(2024, 3, 10))
            .await
            .unwrap();
        assert_eq!(stats.progress_percent, 0);
    }

    #[tokio::test]
    async fn test_queries_exactly_the_resolved_window() {
        let goal = goal(Cadence::Weekly, 10);
        let mut sums = HashMap::new();
        sums.insert((goal.id, day(2024, 3, 4), day(2024, 3, 10)), 7);
        let provider = FixedSums(sums);

        let stats = compute_stats(&goal, &provider, noon(2024, 3, 6)).await.unwrap();
        assert_eq!(stats.progress_percent, 70);
    }

    #[tokio::test]
    async fn test_zero_target_treated_as_one() {
        let goal = goal(Cadence::Daily, 0);
        let logs = FakeLogs::new(vec![LogEntry::new(goal.id, day(2024, 3, 10))]);

        let stats = compute_stats(&goal, &logs, noon(2024, 3, 10)).await.unwrap();
        assert_eq!(stats.progress_percent, 100);
    }

    #[tokio::test]
    async fn test_idempotent() {
        let goal = goal(Cadence::Monthly, 3);
        let logs = FakeLogs::new(vec![LogEntry::new(goal.id, day(2024, 3, 1))]);

        let first = compute_stats(&goal, &logs, noon(2024, 3, 20)).await.unwrap();
        let second = compute_stats(&goal, &logs, noon(2024, 3, 20)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let goal = goal(Cadence::Daily, 1);
        let err = compute_stats(&goal, &Unreachable, noon(2024, 3, 10))
            .await
            .unwrap_err();
        assert_eq!(err, "store unreachable");
    }

    #[tokio::test]
    async fn test_storage_is_a_provider() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = tally_storage::JsonStorage::new(dir.path()).await.unwrap();
        let goal = goal(Cadence::Daily, 2);
        storage.save_goal(&goal).await.unwrap();
        storage
            .save_log(&LogEntry::new(goal.id, day(2024, 3, 10)))
            .await
            .unwrap();

        let stats = compute_stats(&goal, &storage, noon(2024, 3, 10)).await.unwrap();
        assert_eq!(stats.progress_percent, 50);
    }

    #[tokio::test]
    async fn test_huge_totals_cap_at_full() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = tally_storage::JsonStorage::new(dir.path()).await.unwrap();
        let goal = goal(Cadence::Daily, 2);
        storage.save_goal(&goal).await.unwrap();
        for _ in 0..2 {
            storage
                .save_log(&LogEntry::new(goal.id, day(2024, 3, 10)).with_value(i64::MAX))
                .await
                .unwrap();
        }

        let stats = compute_stats(&goal, &storage, noon(2024, 3, 10)).await.unwrap();
        assert_eq!(stats.progress_percent, 100);
    }

    #[tokio::test]
    async fn test_corrupt_log_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = tally_storage::JsonStorage::new(dir.path()).await.unwrap();
        let goal = goal(Cadence::Daily, 2);
        storage.save_goal(&goal).await.unwrap();
        storage
            .save_log(&LogEntry::new(goal.id, day(2024, 3, 10)))
            .await
            .unwrap();
        let logs_dir = dir.path().join("logs").join(goal.id.to_string());
        std::fs::write(logs_dir.join("bad.json"), b"{oops").unwrap();

        let err = compute_stats(&goal, &storage, noon(2024, 3, 10)).await.unwrap_err();
        assert!(matches!(err, StorageError::Json(_)));
    }

    #[test]
    fn test_stats_serialize_with_iso_dates() {
        let stats = StatsResult {
            period_start: day(2024, 3, 4),
            period_end: day(2024, 3, 10),
            progress_percent: 40,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["period_start"], "2024-03-04");
        assert_eq!(json["period_end"], "2024-03-10");
        assert_eq!(json["progress_percent"], 40);
        assert_eq!(stats.window().days(), 7);
    }
}
