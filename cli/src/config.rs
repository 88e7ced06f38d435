//! Store layout read from a JSON file
//!
//! ```json
//! {
//!   "master": {"kind": "sqlite", "path": "main.db"},
//!   "redundancies": [{"kind": "sqlite", "path": "mirror.db"}, {"kind": "memory"}]
//! }
//! ```

use std::path::{Path, PathBuf};

use kevast::{DeferredMemoryStorage, MemoryStorage, Storage};
use serde::Deserialize;
use thiserror::Error;

use crate::sqlite::SqliteStorage;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot open sqlite database {path}: {source}")]
    Sqlite {
        path: PathBuf,
        source: rusqlite::Error,
    },
}

/// One backend of the store
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Memory,
    MemoryDeferred,
    Sqlite { path: PathBuf },
}

impl BackendConfig {
    /// Open the backend
    ///
    /// # Errors
    ///
    /// Returns an error if a SQLite database cannot be opened.
    pub fn open(&self) -> Result<Storage, ConfigError> {
        Ok(match self {
            Self::Memory => Storage::immediate(MemoryStorage::new()),
            Self::MemoryDeferred => Storage::deferred(DeferredMemoryStorage::new()),
            Self::Sqlite { path } => {
                let storage = SqliteStorage::open(path).map_err(|source| ConfigError::Sqlite {
                    path: path.clone(),
                    source,
                })?;
                Storage::immediate(storage)
            }
        })
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub master: BackendConfig,
    #[serde(default)]
    pub redundancies: Vec<BackendConfig>,
}

impl Default for StoreConfig {
    /// A single SQLite database in the working directory
    fn default() -> Self {
        Self {
            master: BackendConfig::Sqlite {
                path: PathBuf::from("kevast.db"),
            },
            redundancies: Vec::new(),
        }
    }
}

impl StoreConfig {
    /// Parse a config from JSON text
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or names an unknown kind.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Open every backend, master first
    ///
    /// # Errors
    ///
    /// Returns the first backend that fails to open.
    pub fn open(&self) -> Result<(Storage, Vec<Storage>), ConfigError> {
        let master = self.master.open()?;
        let redundancies = self
            .redundancies
            .iter()
            .map(BackendConfig::open)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((master, redundancies))
    }
}
