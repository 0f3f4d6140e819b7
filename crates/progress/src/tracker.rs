//! Progress tracking service.

use std::ops::Deref;
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use tally_core::{Goal, GoalId, Time};
use tally_storage::{Result, Storage};

use crate::aggregator::{compute_stats, StatsResult};

/// A goal together with its current-period stats.
#[derive(Debug, Clone, Serialize)]
pub struct GoalStats {
    /// The goal
    #[serde(flatten)]
    pub goal: Goal,

    /// Progress in the period containing the reference instant
    pub stats: StatsResult,
}

/// Stats for every goal, taken at one reference instant.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    /// When snapshot was taken
    pub timestamp: Time,

    /// Reference instant the periods were resolved against
    pub reference: NaiveDateTime,

    /// Goal stats, in storage listing order
    pub goals: Vec<GoalStats>,
}

/// Computes goal stats straight from a store.
///
/// Holds any handle that derefs to a store (`Arc`, `Box` or a plain
/// reference). Every call re-aggregates; nothing is cached between calls.
#[derive(Clone)]
pub struct ProgressTracker<H> {
    storage: H,
}

impl<H> ProgressTracker<H>
where
    H: Deref,
    H::Target: Storage,
{
    /// Create a tracker over a store handle.
    pub fn new(storage: H) -> Self {
        Self { storage }
    }

    /// Stats for an already-loaded goal.
    pub async fn stats_for(&self, goal: &Goal, now: NaiveDateTime) -> Result<StatsResult> {
        compute_stats(goal, &*self.storage, now).await
    }

    /// Load a goal and compute its stats. `None` when the goal does not exist.
    pub async fn goal_stats(&self, goal_id: GoalId, now: NaiveDateTime) -> Result<Option<GoalStats>> {
        let Some(goal) = self.storage.load_goal(goal_id).await? else {
            return Ok(None);
        };
        let stats = self.stats_for(&goal, now).await?;
        Ok(Some(GoalStats { goal, stats }))
    }

    /// Stats for every goal in the store.
    pub async fn snapshot(&self, now: NaiveDateTime) -> Result<ProgressSnapshot> {
        let goals = self.storage.list_goals().await?;
        let mut goal_stats = Vec::with_capacity(goals.len());

        for goal in goals {
            let stats = self.stats_for(&goal, now).await?;
            goal_stats.push(GoalStats { goal, stats });
        }

        Ok(ProgressSnapshot {
            timestamp: Utc::now(),
            reference: now,
            goals: goal_stats,
        })
    }
}
