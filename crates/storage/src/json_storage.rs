//! JSON file storage implementation.
//!
//! Stores one pretty-printed JSON file per record:
//!
//! ```text
//! <root>/goals/<goal_id>.json
//! <root>/logs/<goal_id>/<log_id>.json
//! ```
//!
//! Keeping each goal's entries in their own directory makes the cascade on
//! goal deletion a single directory removal.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use chrono::NaiveDate;
use tally_core::{Goal, GoalId, LogEntry, LogEntryId};
use tokio::fs;
use tracing::{debug, info, warn};
use super::trait_::{saturating_sum, sort_logs, Storage, StorageError, Result};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Open storage rooted at `root`, creating the directory layout if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("goals")).await?;
        fs::create_dir_all(root.join("logs")).await?;

        info!("Opened JSON storage at {}", root.display());
        Ok(Self { root })
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn goal_path(&self, id: GoalId) -> PathBuf {
        self.root.join("goals").join(format!("{}.json", id))
    }

    fn goal_logs_dir(&self, goal_id: GoalId) -> PathBuf {
        self.root.join("logs").join(goal_id.to_string())
    }

    fn log_path(&self, goal_id: GoalId, id: LogEntryId) -> PathBuf {
        self.goal_logs_dir(goal_id).join(format!("{}.json", id))
    }

    /// Find the file holding a log entry without knowing its goal.
    async fn find_log_path(&self, id: LogEntryId) -> Result<Option<PathBuf>> {
        let file_name = format!("{}.json", id);
        let mut goals = fs::read_dir(self.root.join("logs")).await?;
        while let Some(dir) = goals.next_entry().await? {
            let candidate = dir.path().join(&file_name);
            if fs::try_exists(&candidate).await? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn save_goal(&mut self, goal: &Goal) -> Result<()> {
        let json = serde_json::to_string_pretty(goal)?;
        fs::write(self.goal_path(goal.id), json.as_bytes()).await?;
        debug!("Saved goal {}", goal.id);
        Ok(())
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>> {
        read_json(&self.goal_path(id)).await
    }

    async fn list_goals(&self) -> Result<Vec<Goal>> {
        let mut goals: Vec<Goal> = list_dir(&self.root.join("goals")).await?;
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(goals)
    }

    async fn delete_goal(&mut self, id: GoalId) -> Result<bool> {
        let existed = remove_if_exists(&self.goal_path(id)).await?;

        match fs::remove_dir_all(self.goal_logs_dir(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if existed {
            info!("Deleted goal {} and its log entries", id);
        }
        Ok(existed)
    }

    async fn save_log(&mut self, entry: &LogEntry) -> Result<()> {
        if !fs::try_exists(self.goal_path(entry.goal_id)).await? {
            return Err(StorageError::NotFound(format!("goal {}", entry.goal_id)));
        }

        fs::create_dir_all(self.goal_logs_dir(entry.goal_id)).await?;
        let json = serde_json::to_string_pretty(entry)?;
        fs::write(self.log_path(entry.goal_id, entry.id), json.as_bytes()).await?;
        debug!("Saved log {} for goal {}", entry.id, entry.goal_id);
        Ok(())
    }

    async fn load_log(&self, id: LogEntryId) -> Result<Option<LogEntry>> {
        match self.find_log_path(id).await? {
            Some(path) => read_json(&path).await,
            None => Ok(None),
        }
    }

    async fn list_logs(&self, goal_id: GoalId) -> Result<Vec<LogEntry>> {
        let dir = self.goal_logs_dir(goal_id);
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }

        let mut logs: Vec<LogEntry> = list_dir(&dir).await?;
        sort_logs(&mut logs);
        Ok(logs)
    }

    async fn delete_log(&mut self, id: LogEntryId) -> Result<bool> {
        match self.find_log_path(id).await? {
            Some(path) => remove_if_exists(&path).await,
            None => Ok(false),
        }
    }

    async fn sum_in_range(&self, goal_id: GoalId, start: NaiveDate, end: NaiveDate) -> Result<i64> {
        let dir = self.goal_logs_dir(goal_id);
        if !fs::try_exists(&dir).await? {
            return Ok(0);
        }

        // Undecodable entries fail the sum rather than shrink it.
        let logs: Vec<LogEntry> = read_dir_strict(&dir).await?;
        let total = saturating_sum(
            logs.iter()
                .filter(|entry| entry.entry_date >= start && entry.entry_date <= end)
                .map(|entry| entry.value),
        );
        Ok(total)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Every record in `dir`, skipping files that fail to decode.
async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for path in json_files(dir).await? {
        match read_json(&path).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
        }
    }
    Ok(items)
}

/// Every record in `dir`; the first file that fails to decode is an error.
async fn read_dir_strict<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for path in json_files(dir).await? {
        if let Some(item) = read_json(&path).await? {
            items.push(item);
        }
    }
    Ok(items)
}

async fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
