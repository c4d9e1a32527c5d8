// src/entity/note.rs
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Realm;

/// Title shown for scrolls that were never named.
pub const UNTITLED: &str = "无名经文";

/// Opaque scroll identifier.
///
/// Fresh ids are random UUIDs. Ids read back from storage are kept verbatim, so collections written by older clients
/// (decimal millisecond strings) keep working.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generate a fresh id, retrying while `taken` reports a clash.
    pub fn generate(taken: impl Fn(&NoteId) -> bool) -> Self {
        loop {
            let id = NoteId(Uuid::new_v4().to_string());
            if !taken(&id) {
                return id;
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven characters, for compact listings.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(7) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        NoteId(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        NoteId(value.to_string())
    }
}

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Truncate to whole milliseconds, the precision timestamps are stored with.
pub fn to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = at.nanosecond() / 1_000_000 * 1_000_000;
    at.with_nanosecond(nanos).unwrap_or(at)
}

/// A single scroll in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub realm: Realm,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(id: NoteId, realm: Realm, now: DateTime<Utc>) -> Self {
        let now = to_millis(now);
        Self {
            id,
            title: String::new(),
            content: String::new(),
            realm,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// Merge `patch` into the note and bump `updated_at`.
    ///
    /// `updated_at` never moves backwards, even when the clock does.
    pub fn apply_patch(&mut self, patch: NotePatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(realm) = patch.realm {
            self.realm = realm;
        }
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        let now = to_millis(now);
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }
}

/// Content after applying a spirit reply: appended after a blank line, or
/// used as-is when the scroll is still empty.
pub fn merge_reply(existing: &str, reply: &str) -> String {
    if existing.is_empty() {
        reply.to_string()
    } else {
        format!("{}\n\n{}", existing, reply)
    }
}

/// Typed partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub realm: Option<Realm>,
}

impl NotePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn realm(realm: Realm) -> Self {
        Self {
            realm: Some(realm),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.realm.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_new_note_is_empty() {
        let note = Note::new(NoteId::from("a"), Realm::default(), at(1_000));
        assert!(note.title.is_empty());
        assert!(note.content.is_empty());
        assert_eq!(note.realm, Realm::QiCondensation);
        assert_eq!(note.created_at, note.updated_at);
        assert_eq!(note.display_title(), UNTITLED);
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut note = Note::new(NoteId::from("a"), Realm::default(), at(1_000));
        note.content = "丹田".to_string();

        note.apply_patch(NotePatch::title("筑基心得"), at(2_000));

        assert_eq!(note.title, "筑基心得");
        assert_eq!(note.content, "丹田");
        assert_eq!(note.realm, Realm::QiCondensation);
        assert_eq!(note.created_at, at(1_000));
        assert_eq!(note.updated_at, at(2_000));
    }

    #[test]
    fn test_updated_at_never_goes_backwards() {
        let mut note = Note::new(NoteId::from("a"), Realm::default(), at(5_000));
        note.apply_patch(NotePatch::realm(Realm::GoldenCore), at(1_000));
        assert_eq!(note.updated_at, at(5_000));
        assert!(note.updated_at >= note.created_at);
    }

    #[test]
    fn test_timestamps_truncated_to_millis() {
        let precise = at(1_234) + Duration::nanoseconds(567_891);
        let note = Note::new(NoteId::from("a"), Realm::default(), precise);
        assert_eq!(note.created_at, at(1_234));
    }

    #[test]
    fn test_generate_skips_taken_ids() {
        let first = NoteId::generate(|_| false);
        let second = NoteId::generate(|id| id == &first);
        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 36);
    }

    #[test]
    fn test_serializes_like_browser_storage() {
        let mut note = Note::new(NoteId::from("1717000000000"), Realm::Foundation, at(1_717_000_000_000));
        note.title = "筑基心得".to_string();
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["id"], "1717000000000");
        assert_eq!(json["realm"], "筑基期");
        assert_eq!(json["createdAt"], 1_717_000_000_000_i64);
        assert_eq!(json["updatedAt"], 1_717_000_000_000_i64);
    }

    #[test]
    fn test_merge_reply() {
        assert_eq!(merge_reply("", "道"), "道");
        assert_eq!(merge_reply("心", "道"), "心\n\n道");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(NoteId::from("0190a1b2-c3d4").short(), "0190a1b");
        assert_eq!(NoteId::from("1").short(), "1");
    }
}
