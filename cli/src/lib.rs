//! Command-line front end for `kevast`: store configuration, a SQLite
//! backend and a logging interceptor

pub mod access_log;
pub mod config;
pub mod sqlite;

pub use access_log::AccessLog;
pub use config::{BackendConfig, ConfigError, StoreConfig};
pub use sqlite::SqliteStorage;
