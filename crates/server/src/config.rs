//! Server configuration from environment variables.

use std::path::PathBuf;
use anyhow::{Context, Result};
use tally_storage::Backend;

/// Bind address variable.
pub const ENV_BIND: &str = "TALLY_SERVER_BIND";
/// Port variable.
pub const ENV_PORT: &str = "TALLY_SERVER_PORT";
/// Data directory variable.
pub const ENV_DATA_DIR: &str = "TALLY_DATA_DIR";
/// Storage backend variable.
pub const ENV_BACKEND: &str = "TALLY_BACKEND";

/// Tally server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub bind: String,
    /// TCP port
    pub port: u16,
    /// Directory holding tally data
    pub data_dir: PathBuf,
    /// Storage backend
    pub backend: Backend,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8300,
            data_dir: ".tally".into(),
            backend: Backend::Json,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by any `TALLY_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(bind) = lookup(ENV_BIND) {
            config.bind = bind;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.port = port
                .parse()
                .with_context(|| format!("{ENV_PORT} must be a port number, got `{port}`"))?;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = dir.into();
        }
        if let Some(backend) = lookup(ENV_BACKEND) {
            config.backend = backend.parse()?;
        }

        Ok(config)
    }

    /// `bind:port` listen address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
