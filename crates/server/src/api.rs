//! REST handlers.

use std::sync::Arc;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tally_core::{parse_date, Cadence, Goal, GoalId, LogEntry, LogEntryId, DEFAULT_LOG_VALUE};
use tally_progress::{GoalStats, ProgressTracker, StatsResult};
use tally_storage::{Storage, StorageError};
use tracing::{error, info};

use crate::AppState;

/// Handler result; errors become a status code and plain-text body.
pub type ApiResult<T> = Result<T, (StatusCode, String)>;

// ── Request / response types ──────────────────────────────────────────────

/// Body of `POST /api/goals`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateGoalRequest {
    /// Goal title, required
    #[serde(default)]
    pub title: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Cadence label, defaults to `daily`
    #[serde(default)]
    pub cadence: Option<String>,
    /// Per-period target, defaults to 1
    #[serde(default)]
    pub target_value: Option<i64>,
}

/// Body of `POST /api/goals/{id}/logs`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateLogRequest {
    /// `YYYY-MM-DD`, defaults to today
    #[serde(default)]
    pub entry_date: Option<String>,
    /// Amount, defaults to 1
    #[serde(default)]
    pub value: Option<i64>,
    /// Optional note
    #[serde(default)]
    pub note: Option<String>,
}

/// Response of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok`
    pub status: String,
    /// Server version
    pub version: String,
}

/// Response of the delete endpoints.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    /// ID of the removed record
    pub deleted: String,
}

// ── Error mapping ─────────────────────────────────────────────────────────

fn bad_request(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, e.to_string())
}

fn not_found(what: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{what} not found"))
}

fn storage_error(e: StorageError) -> (StatusCode, String) {
    match e {
        StorageError::NotFound(what) => not_found(what),
        other => {
            error!("Storage failure: {}", other);
            (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

fn parse_goal_id(id: &str) -> ApiResult<GoalId> {
    id.parse().map_err(|_| bad_request(format!("invalid goal id `{id}`")))
}

async fn load_goal(storage: &dyn Storage, id: GoalId) -> ApiResult<Goal> {
    storage
        .load_goal(id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| not_found(format!("goal {id}")))
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/goals`
pub async fn list_goals(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<GoalStats>>> {
    let now = state.now();
    let storage = state.storage.read().await;
    let snapshot = ProgressTracker::new(&**storage)
        .snapshot(now)
        .await
        .map_err(storage_error)?;
    Ok(Json(snapshot.goals))
}

/// `POST /api/goals`
pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateGoalRequest>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    let cadence = match request.cadence.as_deref() {
        Some(label) => label.parse::<Cadence>().map_err(bad_request)?,
        None => Cadence::default(),
    };
    let mut goal = Goal::new(request.title, cadence).map_err(bad_request)?;
    if let Some(target) = request.target_value {
        goal = goal.with_target_value(target);
    }
    if let Some(description) = request.description {
        goal = goal.with_description(description);
    }

    state
        .storage
        .write()
        .await
        .save_goal(&goal)
        .await
        .map_err(storage_error)?;
    info!("Created goal {} ({})", goal.id, goal.cadence);

    Ok((StatusCode::CREATED, Json(goal)))
}

/// `GET /api/goals/{id}`
pub async fn get_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<GoalStats>> {
    let goal_id = parse_goal_id(&id)?;
    let now = state.now();
    let storage = state.storage.read().await;

    ProgressTracker::new(&**storage)
        .goal_stats(goal_id, now)
        .await
        .map_err(storage_error)?
        .map(Json)
        .ok_or_else(|| not_found(format!("goal {goal_id}")))
}

/// `DELETE /api/goals/{id}`
pub async fn delete_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    let goal_id = parse_goal_id(&id)?;
    let deleted = state
        .storage
        .write()
        .await
        .delete_goal(goal_id)
        .await
        .map_err(storage_error)?;

    if !deleted {
        return Err(not_found(format!("goal {goal_id}")));
    }
    Ok(Json(DeletedResponse {
        deleted: goal_id.to_string(),
    }))
}

/// `GET /api/goals/{id}/stats`
pub async fn goal_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatsResult>> {
    let goal_id = parse_goal_id(&id)?;
    let now = state.now();
    let storage = state.storage.read().await;

    let goal = load_goal(&**storage, goal_id).await?;
    let stats = ProgressTracker::new(&**storage)
        .stats_for(&goal, now)
        .await
        .map_err(storage_error)?;
    Ok(Json(stats))
}

/// `GET /api/goals/{id}/logs`
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<LogEntry>>> {
    let goal_id = parse_goal_id(&id)?;
    let storage = state.storage.read().await;

    load_goal(&**storage, goal_id).await?;
    let logs = storage.list_logs(goal_id).await.map_err(storage_error)?;
    Ok(Json(logs))
}

/// `POST /api/goals/{id}/logs`
pub async fn create_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<CreateLogRequest>,
) -> ApiResult<(StatusCode, Json<LogEntry>)> {
    let goal_id = parse_goal_id(&id)?;
    let entry_date = match request.entry_date.as_deref() {
        Some(date) => parse_date(date).map_err(bad_request)?,
        None => state.now().date(),
    };

    let mut entry = LogEntry::new(goal_id, entry_date)
        .with_value(request.value.unwrap_or(DEFAULT_LOG_VALUE));
    if let Some(note) = request.note {
        entry = entry.with_note(note);
    }

    state
        .storage
        .write()
        .await
        .save_log(&entry)
        .await
        .map_err(storage_error)?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// `DELETE /api/logs/{id}`
pub async fn delete_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    let log_id: LogEntryId = id
        .parse()
        .map_err(|_| bad_request(format!("invalid log id `{id}`")))?;
    let deleted = state
        .storage
        .write()
        .await
        .delete_log(log_id)
        .await
        .map_err(storage_error)?;

    if !deleted {
        return Err(not_found(format!("log entry {log_id}")));
    }
    Ok(Json(DeletedResponse {
        deleted: log_id.to_string(),
    }))
}
