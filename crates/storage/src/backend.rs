//! Backend selection for binaries.

use std::path::Path;
use crate::{JsonStorage, Result, Storage, StorageError};

/// File name of the SQLite database inside the data directory.
pub const SQLITE_FILE_NAME: &str = "tally.db";

/// Available storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// One JSON file per record
    #[default]
    Json,
    /// SQLite database (requires the `sqlite` feature)
    Sqlite,
}

impl Backend {
    /// Lowercase backend name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Json => "json",
            Backend::Sqlite => "sqlite",
        }
    }

    /// Open this backend under `data_dir`.
    pub async fn open(self, data_dir: &Path) -> Result<Box<dyn Storage>> {
        match self {
            Backend::Json => Ok(Box::new(JsonStorage::new(data_dir).await?)),
            Backend::Sqlite => open_sqlite(data_dir).await,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Backend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Backend::Json),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(StorageError::Other(format!(
                "unknown backend `{other}`; expected json|sqlite"
            ))),
        }
    }
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(data_dir: &Path) -> Result<Box<dyn Storage>> {
    tokio::fs::create_dir_all(data_dir).await?;
    let storage = crate::SqliteStorage::new_from_path(&data_dir.join(SQLITE_FILE_NAME)).await?;
    Ok(Box::new(storage))
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(_data_dir: &Path) -> Result<Box<dyn Storage>> {
    Err(StorageError::Other(
        "sqlite backend not available; rebuild with the `sqlite` feature".to_string(),
    ))
}
