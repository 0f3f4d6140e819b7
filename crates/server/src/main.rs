//! Tally server binary.
//!
//! Configured through `TALLY_SERVER_BIND`, `TALLY_SERVER_PORT`,
//! `TALLY_DATA_DIR` and `TALLY_BACKEND`.

use std::sync::Arc;
use anyhow::Context;
use tally_server::{router, AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let storage = config
        .backend
        .open(&config.data_dir)
        .await
        .with_context(|| format!("failed to open {} storage at {}", config.backend, config.data_dir.display()))?;

    let app = router(Arc::new(AppState::new(storage)));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Tally server listening on {addr} ({} backend)", config.backend);

    axum::serve(listener, app).await?;
    Ok(())
}
