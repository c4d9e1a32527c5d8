use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::entity::{Note, NoteId, NotePatch, Realm};
use crate::error::{Result, ScrollError};

/// Ordered scrolls plus the active selection.
///
/// New scrolls go to the front, so index order is also recency order. The
/// selection is kept pointing at an existing scroll across deletes.
#[derive(Debug, Clone, Default)]
pub struct NoteCollection {
    notes: Vec<Note>,
    selected: Option<NoteId>,
}

impl NoteCollection {
    /// Wrap loaded scrolls, selecting the first one.
    pub fn new(notes: Vec<Note>) -> Self {
        let selected = notes.first().map(|n| n.id.clone());
        Self { notes, selected }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| &n.id == id)
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn selected_id(&self) -> Option<&NoteId> {
        self.selected.as_ref()
    }

    /// The selected scroll, if the selection still resolves.
    pub fn selected(&self) -> Option<&Note> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Insert an empty scroll at the front and select it.
    pub fn create(&mut self, realm: Realm, now: DateTime<Utc>) -> NoteId {
        let id = NoteId::generate(|candidate| self.contains(candidate));
        self.notes.insert(0, Note::new(id.clone(), realm, now));
        self.selected = Some(id.clone());
        debug!(id = %id, "Created scroll");
        id
    }

    /// Merge `patch` into the scroll with `id`. Unknown ids are ignored.
    pub fn update(&mut self, id: &NoteId, patch: NotePatch, now: DateTime<Utc>) -> bool {
        match self.notes.iter_mut().find(|n| &n.id == id) {
            Some(note) => {
                note.apply_patch(patch, now);
                true
            }
            None => {
                warn!(id = %id, "Ignoring update for unknown scroll");
                false
            }
        }
    }

    /// Remove the scroll with `id`, moving the selection to the new first
    /// scroll when the removed one was selected.
    pub fn delete(&mut self, id: &NoteId) -> Option<Note> {
        let pos = self.notes.iter().position(|n| &n.id == id)?;
        let removed = self.notes.remove(pos);
        if self.selected.as_ref() == Some(id) {
            self.selected = self.notes.first().map(|n| n.id.clone());
        }
        debug!(id = %id, remaining = self.notes.len(), "Deleted scroll");
        Some(removed)
    }

    /// Set the selection without checking that `id` exists.
    pub fn select(&mut self, id: NoteId) {
        self.selected = Some(id);
    }

    /// Find a scroll by exact id, 1-based list position, or unique id prefix.
    pub fn resolve(&self, reference: &str) -> Result<&Note> {
        let reference = reference.trim();
        if let Some(note) = self.get(&NoteId::from(reference)) {
            return Ok(note);
        }

        if let Ok(position) = reference.parse::<usize>() {
            if let Some(note) = position.checked_sub(1).and_then(|i| self.notes.get(i)) {
                return Ok(note);
            }
        }

        if !reference.is_empty() {
            let mut matches = self
                .notes
                .iter()
                .filter(|n| n.id.as_str().starts_with(reference));
            if let Some(first) = matches.next() {
                if matches.next().is_some() {
                    return Err(ScrollError::AmbiguousId(reference.to_string()));
                }
                return Ok(first);
            }
        }

        Err(ScrollError::NoteNotFound(reference.to_string()))
    }
}
