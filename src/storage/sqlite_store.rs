use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::KeyValueStore;
use crate::error::{Result, ScrollError};

const SCROLLS_DB: &str = "scrolls.db";

/// Key/value table in a SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create `scrolls.db` inside the scrolls directory
    pub fn open(scrolls_dir: &Path) -> Result<Self> {
        if !scrolls_dir.is_dir() {
            return Err(ScrollError::NotInitialized);
        }
        let path = scrolls_dir.join(SCROLLS_DB);
        let conn = Connection::open(&path)?;

        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{load_notes, save_notes};
    use crate::entity::{Note, NoteId, Realm};
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_set_overwrites() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_notes_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let note = Note::new(NoteId::from("n1"), Realm::NascentSoul, Utc::now());

        {
            let mut store = SqliteStore::open(tmp.path()).unwrap();
            save_notes(&mut store, std::slice::from_ref(&note)).unwrap();
        }

        let store = SqliteStore::open(tmp.path()).unwrap();
        let loaded = load_notes(&store).unwrap().unwrap();
        assert_eq!(loaded, vec![note]);
        assert!(tmp.path().join(SCROLLS_DB).exists());
    }
}
