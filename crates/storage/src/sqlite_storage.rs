//! SQLite storage backend for Tally.
//!
//! Goals and log entries live in two tables linked by a cascading foreign
//! key. Dates are stored as `YYYY-MM-DD` text so range bounds compare
//! lexically.

use std::path::Path;
use std::str::FromStr;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tally_core::{format_date, parse_date, Cadence, Goal, GoalId, LogEntry, LogEntryId, Time};
use tracing::{debug, info};

use super::trait_::{saturating_sum, Storage, StorageError, Result};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS goals (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        cadence TEXT NOT NULL DEFAULT 'daily',
        target_value INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS log_entries (
        id TEXT PRIMARY KEY,
        goal_id TEXT NOT NULL REFERENCES goals(id) ON DELETE CASCADE,
        entry_date TEXT NOT NULL,
        value INTEGER NOT NULL DEFAULT 1,
        note TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_log_entries_goal_date ON log_entries(goal_id, entry_date)",
];

/// SQLite storage implementation.
#[derive(Clone)]
pub struct SqliteStorage {
    /// Database connection pool
    pool: sqlx::SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) a database from a `sqlite:` URL or plain file path.
    pub async fn new(db_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(db_url)?;
        let storage = Self::connect(options).await?;
        info!("Opened SQLite storage at {}", db_url);
        Ok(storage)
    }

    /// Open a database file at `path`.
    pub async fn new_from_path(path: &Path) -> Result<Self> {
        let storage = Self::connect(SqliteConnectOptions::new().filename(path)).await?;
        info!("Opened SQLite storage at {}", path.display());
        Ok(storage)
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        let options = options.create_if_missing(true).foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Create an in-memory SQLite storage for testing.
    ///
    /// Uses a single connection so every query sees the same database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize the database schema.
    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    fn goal_from_row(row: &SqliteRow) -> Result<Goal> {
        let id: String = row.try_get("id")?;
        let cadence: String = row.try_get("cadence")?;

        Ok(Goal {
            id: id
                .parse()
                .map_err(|_| tally_core::CoreError::InvalidId(id.clone()))?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            cadence: Cadence::from(cadence.as_str()),
            target_value: row.try_get("target_value")?,
            created_at: row.try_get::<Time, _>("created_at")?,
        })
    }

    fn log_from_row(row: &SqliteRow) -> Result<LogEntry> {
        let id: String = row.try_get("id")?;
        let goal_id: String = row.try_get("goal_id")?;
        let entry_date: String = row.try_get("entry_date")?;

        Ok(LogEntry {
            id: id
                .parse()
                .map_err(|_| tally_core::CoreError::InvalidId(id.clone()))?,
            goal_id: goal_id
                .parse()
                .map_err(|_| tally_core::CoreError::InvalidId(goal_id.clone()))?,
            entry_date: parse_date(&entry_date)?,
            value: row.try_get("value")?,
            note: row.try_get("note")?,
            created_at: row.try_get::<Time, _>("created_at")?,
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    // === Goal operations ===

    async fn save_goal(&mut self, goal: &Goal) -> Result<()> {
        sqlx::query(
            "INSERT INTO goals (id, title, description, cadence, target_value, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                cadence = excluded.cadence,
                target_value = excluded.target_value",
        )
        .bind(goal.id.to_string())
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.cadence.as_str())
        .bind(goal.target_value)
        .bind(goal.created_at)
        .execute(&self.pool)
        .await?;

        debug!("Saved goal {}", goal.id);
        Ok(())
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>> {
        let row = sqlx::query("SELECT * FROM goals WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::goal_from_row).transpose()
    }

    async fn list_goals(&self) -> Result<Vec<Goal>> {
        let rows = sqlx::query("SELECT * FROM goals ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::goal_from_row).collect()
    }

    async fn delete_goal(&mut self, id: GoalId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM goals WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted goal {} and its log entries", id);
        }
        Ok(deleted)
    }

    // === Log operations ===

    async fn save_log(&mut self, entry: &LogEntry) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO log_entries (id, goal_id, entry_date, value, note, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                entry_date = excluded.entry_date,
                value = excluded.value,
                note = excluded.note",
        )
        .bind(entry.id.to_string())
        .bind(entry.goal_id.to_string())
        .bind(format_date(entry.entry_date))
        .bind(entry.value)
        .bind(&entry.note)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!("Saved log {} for goal {}", entry.id, entry.goal_id);
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(StorageError::NotFound(format!("goal {}", entry.goal_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn load_log(&self, id: LogEntryId) -> Result<Option<LogEntry>> {
        let row = sqlx::query("SELECT * FROM log_entries WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::log_from_row).transpose()
    }

    async fn list_logs(&self, goal_id: GoalId) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM log_entries WHERE goal_id = ?
            ORDER BY entry_date DESC, created_at DESC",
        )
        .bind(goal_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::log_from_row).collect()
    }

    async fn delete_log(&mut self, id: LogEntryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM log_entries WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn sum_in_range(&self, goal_id: GoalId, start: NaiveDate, end: NaiveDate) -> Result<i64> {
        // SQLite's SUM raises on integer overflow, so add up in Rust.
        let values: Vec<i64> = sqlx::query_scalar(
            "SELECT value FROM log_entries
            WHERE goal_id = ? AND entry_date >= ? AND entry_date <= ?",
        )
        .bind(goal_id.to_string())
        .bind(format_date(start))
        .bind(format_date(end))
        .fetch_all(&self.pool)
        .await?;

        Ok(saturating_sum(values))
    }
}
