//! SQLite-backed implementation of `SyncStorage`
//!
//! Keeps every pair in one table, so contents survive across program runs.
//! Rows are read back in rowid order; an overwrite updates the row in place,
//! which keeps the key at its original position.

use kevast::{StorageError, SyncStorage};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

/// SQLite-backed immediate storage
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database at the given path
    ///
    /// Creates the table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if database cannot be opened or table creation fails.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, rusqlite::Error> {
        Self::with_connection(Connection::open(db_path)?)
    }

    /// Private database that disappears with the storage
    ///
    /// # Errors
    ///
    /// Returns error if table creation fails.
    pub fn in_memory() -> Result<Self, rusqlite::Error> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn column<T: rusqlite::types::FromSql>(&self, sql: &str) -> Result<Vec<T>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql).map_err(backend)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, T>(0))
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        Ok(rows)
    }
}

fn backend(e: rusqlite::Error) -> StorageError {
    StorageError::Backend(format!("sqlite: {e}"))
}

impl SyncStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .lock()
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(backend)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(backend)?;
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool, StorageError> {
        self.conn
            .lock()
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM kv WHERE key = ?)",
                params![key],
                |row| row.get::<_, bool>(0),
            )
            .map_err(backend)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .lock()
            .execute("DELETE FROM kv WHERE key = ?", params![key])
            .map_err(backend)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.conn
            .lock()
            .execute("DELETE FROM kv", [])
            .map_err(backend)?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.column("SELECT key FROM kv ORDER BY rowid")
    }

    fn values(&self) -> Result<Vec<String>, StorageError> {
        self.column("SELECT value FROM kv ORDER BY rowid")
    }

    fn entries(&self) -> Result<Vec<(String, String)>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT key, value FROM kv ORDER BY rowid")
            .map_err(backend)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        Ok(rows)
    }

    fn size(&self) -> Result<usize, StorageError> {
        let count = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get::<_, i64>(0))
            .map_err(backend)?;
        usize::try_from(count).map_err(|e| StorageError::Backend(format!("row count: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_has() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert_eq!(storage.get("a").unwrap(), None);
        assert!(!storage.has("a").unwrap());

        storage.set("a", "1").unwrap();

        assert_eq!(storage.get("a").unwrap().as_deref(), Some("1"));
        assert!(storage.has("a").unwrap());
        assert_eq!(storage.size().unwrap(), 1);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();
        storage.set("a", "3").unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["a", "b"]);
        assert_eq!(storage.values().unwrap(), vec!["3", "2"]);
    }

    #[test]
    fn test_delete_and_clear() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();
        storage.set("c", "3").unwrap();

        storage.delete("b").unwrap();
        storage.delete("missing").unwrap();
        assert_eq!(
            storage.entries().unwrap(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("c".to_string(), "3".to_string()),
            ]
        );

        storage.clear().unwrap();
        assert_eq!(storage.size().unwrap(), 0);
    }
}
