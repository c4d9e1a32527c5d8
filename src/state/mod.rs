//! Application state and the reducer that drives it.
//!
//! [`AppState::apply`] is the only way state changes. It performs no I/O: the
//! returned [`Transition`] tells the caller whether the collection changed and
//! has to be written back (see [`crate::session::Session`]).

mod collection;

pub use collection::NoteCollection;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::entity::{merge_reply, Note, NoteId, NotePatch, Realm};
use crate::search;

/// How long the "sealing..." indicator stays up after an edit.
pub const SAVE_INDICATOR_MS: i64 = 800;

/// Transient UI flags. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub sidebar_open: bool,
    pub consultation_open: bool,
    pub saving_until: Option<DateTime<Utc>>,
    pub query: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            consultation_open: false,
            saving_until: None,
            query: String::new(),
        }
    }
}

impl ViewState {
    pub fn is_saving(&self, now: DateTime<Utc>) -> bool {
        self.saving_until.is_some_and(|until| now < until)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Create,
    Select(NoteId),
    Update { id: NoteId, patch: NotePatch },
    /// Only takes effect when `confirmed` is set.
    Delete { id: NoteId, confirmed: bool },
    /// Fold a spirit reply into the scroll it was asked about.
    ApplyReply { id: NoteId, reply: String },
    Search(String),
    ToggleSidebar,
    OpenConsultation,
    CloseConsultation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    ViewChanged,
    CollectionChanged,
}

impl Transition {
    pub fn needs_persist(self) -> bool {
        self == Transition::CollectionChanged
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    collection: NoteCollection,
    view: ViewState,
    default_realm: Realm,
}

impl AppState {
    pub fn new(notes: Vec<Note>, default_realm: Realm) -> Self {
        Self {
            collection: NoteCollection::new(notes),
            view: ViewState::default(),
            default_realm,
        }
    }

    pub fn collection(&self) -> &NoteCollection {
        &self.collection
    }

    pub fn notes(&self) -> &[Note] {
        self.collection.notes()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn default_realm(&self) -> Realm {
        self.default_realm
    }

    pub fn selected(&self) -> Option<&Note> {
        self.collection.selected()
    }

    /// The list as the sidebar shows it, filtered by the current query.
    pub fn visible_notes(&self) -> Vec<&Note> {
        search::filter(self.collection.notes(), &self.view.query)
    }

    pub fn apply(&mut self, action: Action, now: DateTime<Utc>) -> Transition {
        debug!(?action, "Applying action");
        match action {
            Action::Create => {
                self.collection.create(self.default_realm, now);
                Transition::CollectionChanged
            }
            Action::Select(id) => {
                self.collection.select(id);
                Transition::ViewChanged
            }
            Action::Update { id, patch } => self.update(&id, patch, now),
            Action::Delete { id, confirmed } => {
                if !confirmed {
                    debug!(id = %id, "Delete not confirmed");
                    return Transition::Unchanged;
                }
                match self.collection.delete(&id) {
                    Some(_) => Transition::CollectionChanged,
                    None => Transition::Unchanged,
                }
            }
            Action::ApplyReply { id, reply } => {
                let Some(note) = self.collection.get(&id) else {
                    debug!(id = %id, "Reply target is gone");
                    return Transition::Unchanged;
                };
                let content = merge_reply(&note.content, &reply);
                self.update(&id, NotePatch::content(content), now)
            }
            Action::Search(query) => {
                self.view.query = query;
                Transition::ViewChanged
            }
            Action::ToggleSidebar => {
                self.view.sidebar_open = !self.view.sidebar_open;
                Transition::ViewChanged
            }
            Action::OpenConsultation => {
                self.view.consultation_open = true;
                Transition::ViewChanged
            }
            Action::CloseConsultation => {
                self.view.consultation_open = false;
                Transition::ViewChanged
            }
        }
    }

    fn update(&mut self, id: &NoteId, patch: NotePatch, now: DateTime<Utc>) -> Transition {
        if self.collection.update(id, patch, now) {
            self.view.saving_until = Some(now + Duration::milliseconds(SAVE_INDICATOR_MS));
            Transition::CollectionChanged
        } else {
            Transition::Unchanged
        }
    }
}
