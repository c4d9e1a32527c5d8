//! Persistent store adapter.
//!
//! The whole collection lives as one JSON array under [`SCROLLS_KEY`] in a
//! key/value store, the same layout a browser's local storage would hold.

mod file_store;
mod sqlite_store;

pub use file_store::JsonFileStore;
pub use sqlite_store::SqliteStore;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::Note;
use crate::error::Result;

/// Key the serialized collection is stored under.
pub const SCROLLS_KEY: &str = "spirit_scrolls_data";

/// Minimal string key/value storage.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store, used by tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Which backend holds the scrolls on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Json => write!(f, "json"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "file" => Ok(StorageBackend::Json),
            "sqlite" => Ok(StorageBackend::Sqlite),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

/// Open the configured backend inside a `.scrolls/` directory.
pub fn open_store(scrolls_dir: &Path, backend: StorageBackend) -> Result<Box<dyn KeyValueStore>> {
    debug!(dir = %scrolls_dir.display(), %backend, "Opening scroll store");
    match backend {
        StorageBackend::Json => Ok(Box::new(JsonFileStore::open(scrolls_dir)?)),
        StorageBackend::Sqlite => Ok(Box::new(SqliteStore::open(scrolls_dir)?)),
    }
}

/// On-disk shapes accepted when reading. Writers always emit the bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredScrolls {
    Bare(Vec<Note>),
    Versioned {
        #[allow(dead_code)]
        version: u32,
        notes: Vec<Note>,
    },
}

/// Decode a stored collection, dropping later duplicates of an id.
pub fn decode_notes(raw: &str) -> Result<Vec<Note>> {
    let notes = match serde_json::from_str::<StoredScrolls>(raw)? {
        StoredScrolls::Bare(notes) => notes,
        StoredScrolls::Versioned { notes, .. } => notes,
    };

    let mut seen = HashSet::new();
    let total = notes.len();
    let unique: Vec<Note> = notes
        .into_iter()
        .filter(|note| seen.insert(note.id.clone()))
        .collect();
    if unique.len() != total {
        warn!(
            dropped = total - unique.len(),
            "Stored scrolls contained duplicate ids"
        );
    }
    Ok(unique)
}

pub fn encode_notes(notes: &[Note]) -> Result<String> {
    Ok(serde_json::to_string(notes)?)
}

/// Read the collection; `None` when nothing was ever saved.
pub fn load_notes(store: &dyn KeyValueStore) -> Result<Option<Vec<Note>>> {
    match store.get(SCROLLS_KEY)? {
        Some(raw) => decode_notes(&raw).map(Some),
        None => Ok(None),
    }
}

/// Replace the stored collection with `notes`.
pub fn save_notes(store: &mut dyn KeyValueStore, notes: &[Note]) -> Result<()> {
    let raw = encode_notes(notes)?;
    store.set(SCROLLS_KEY, &raw)?;
    debug!(count = notes.len(), bytes = raw.len(), "Saved scrolls");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{NoteId, NotePatch, Realm};
    use chrono::{TimeZone, Utc};

    fn sample(id: &str, title: &str) -> Note {
        let now = Utc.timestamp_millis_opt(1_717_000_000_123).unwrap();
        let mut note = Note::new(NoteId::from(id), Realm::Foundation, now);
        note.apply_patch(NotePatch::title(title), now);
        note
    }

    #[test]
    fn test_missing_key_loads_none() {
        let store = MemoryStore::new();
        assert!(load_notes(&store).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let mut store = MemoryStore::new();
        let notes = vec![sample("b", "金丹"), sample("a", "筑基")];

        save_notes(&mut store, &notes).unwrap();
        let loaded = load_notes(&store).unwrap().unwrap();

        assert_eq!(loaded, notes);
    }

    #[test]
    fn test_decodes_browser_payload() {
        let raw = r#"[{"id":"1","title":"筑基心得","content":"筑基之法，首在定心。","realm":"筑基期","createdAt":1717000000000,"updatedAt":1717000000500}]"#;
        let notes = decode_notes(raw).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id.as_str(), "1");
        assert_eq!(notes[0].realm, Realm::Foundation);
        assert_eq!(notes[0].updated_at.timestamp_millis(), 1_717_000_000_500);
    }

    #[test]
    fn test_decodes_versioned_envelope() {
        let raw = r#"{"version":2,"notes":[{"id":"x","realm":"金丹期","createdAt":1,"updatedAt":2}]}"#;
        let notes = decode_notes(raw).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "");
        assert_eq!(notes[0].realm, Realm::GoldenCore);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let raw = encode_notes(&[sample("a", "first"), sample("a", "second")]).unwrap();
        let notes = decode_notes(&raw).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "first");
    }

    #[test]
    fn test_encode_is_bare_array() {
        let raw = encode_notes(&[sample("a", "t")]).unwrap();
        assert!(raw.starts_with('['));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("sqlite".parse::<StorageBackend>(), Ok(StorageBackend::Sqlite));
        assert_eq!("JSON".parse::<StorageBackend>(), Ok(StorageBackend::Json));
        assert!("postgres".parse::<StorageBackend>().is_err());
    }
}
