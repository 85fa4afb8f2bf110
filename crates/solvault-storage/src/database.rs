//! SQLite-backed key-value database
//!
//! One `kv` table of opaque string values. Writes commit before the call
//! returns, so a read from the same process always sees the latest write.

use crate::Result;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

/// Key-value database handle
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!("Opened vault database at {}", path.as_ref().display());
        Self::init(conn)
    }

    /// Open an in-memory database (tests and throwaway sessions)
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value, replacing any previous one
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete a key; deleting an absent key is a no-op
    pub fn delete(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get("k").unwrap(), None);
        db.set("k", "v1").unwrap();
        assert_eq!(db.get("k").unwrap(), Some("v1".to_string()));
        db.set("k", "v2").unwrap();
        assert_eq!(db.get("k").unwrap(), Some("v2".to_string()));
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        db.set("k", "v").unwrap();
        db.delete("k").unwrap();
        assert!(!db.contains("k").unwrap());
        // Deleting again is fine
        db.delete("k").unwrap();
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.db");
        {
            let db = Database::open(&path).unwrap();
            db.set("k", "persisted").unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get("k").unwrap(), Some("persisted".to_string()));
    }
}
