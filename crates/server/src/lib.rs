//! Tally HTTP server.
//!
//! REST API over a goal store:
//!
//! - `GET    /health`
//! - `GET    /api/goals`: goals with current-period stats
//! - `POST   /api/goals`: create a goal
//! - `GET    /api/goals/{id}`: one goal with stats
//! - `DELETE /api/goals/{id}`: delete a goal and its logs
//! - `GET    /api/goals/{id}/stats`: current-period stats only
//! - `GET    /api/goals/{id}/logs`: a goal's log entries
//! - `POST   /api/goals/{id}/logs`: log progress
//! - `DELETE /api/logs/{id}`: delete a log entry

#![warn(missing_docs)]

pub mod api;
pub mod config;

use std::sync::Arc;
use axum::routing::{delete, get};
use axum::Router;
use chrono::{Local, NaiveDateTime};
use tally_storage::Storage;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

pub use config::ServerConfig;

/// Source of the current local instant.
pub type Clock = fn() -> NaiveDateTime;

/// Shared server state.
pub struct AppState {
    /// Goal and log store
    pub storage: RwLock<Box<dyn Storage>>,
    clock: Clock,
}

impl AppState {
    /// Wrap a store, reading time from the local system clock.
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self {
            storage: RwLock::new(storage),
            clock: local_now,
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current instant, read once per request.
    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/goals", get(api::list_goals).post(api::create_goal))
        .route("/api/goals/{id}", get(api::get_goal).delete(api::delete_goal))
        .route("/api/goals/{id}/stats", get(api::goal_stats))
        .route("/api/goals/{id}/logs", get(api::list_logs).post(api::create_log))
        .route("/api/logs/{id}", delete(api::delete_log))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tally_storage::JsonStorage;

    fn fixed() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_router_builds() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let _app = router(Arc::new(AppState::new(Box::new(storage))));
    }

    #[tokio::test]
    async fn test_clock_override() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let state = AppState::new(Box::new(storage)).with_clock(fixed);
        assert_eq!(state.now(), fixed());
    }
}
