//! The side-effect boundary around [`AppState`].
//!
//! A `Session` owns the state and the key/value store. Every action goes
//! through [`Session::dispatch`], and any transition that changed the
//! collection is written back before the call returns.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::ScrollsConfig;
use crate::entity::{Note, NoteId, NotePatch, Realm};
use crate::error::{Result, ScrollError};
use crate::search;
use crate::spirit::{ConsultMode, SpiritGateway, FALLBACK_REPLY};
use crate::state::{Action, AppState, Transition};
use crate::storage::{self, KeyValueStore};

const SAMPLE_TITLE: &str = "筑基心得";
const SAMPLE_CONTENT: &str = "筑基之法，首在定心。气行如大河奔涌，不可急躁。引天地灵气入体，汇聚丹田，化为液态真元，方可筑成大道之基...";

/// Human-in-the-loop gate in front of deletes.
pub trait Confirm {
    fn confirm(&mut self, note: &Note) -> bool;
}

impl<F: FnMut(&Note) -> bool> Confirm for F {
    fn confirm(&mut self, note: &Note) -> bool {
        self(note)
    }
}

/// Handle for one in-flight consultation.
///
/// Only the most recently issued ticket may apply its result; starting a new
/// consultation makes every earlier ticket stale. The ticket remembers the
/// scroll that was selected when it was issued, and a reply only ever lands
/// there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsultationTicket {
    seq: u64,
    pub mode: ConsultMode,
    target: Option<NoteId>,
}

impl ConsultationTicket {
    /// The scroll this consultation is about.
    pub fn target(&self) -> Option<&NoteId> {
        self.target.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsultationOutcome {
    pub mode: ConsultMode,
    pub prompt: String,
    pub reply: String,
    /// Scroll the consultation was about.
    pub scroll: Option<NoteId>,
    /// Whether the reply was written into that scroll.
    pub applied: bool,
}

pub struct Session {
    state: AppState,
    store: Box<dyn KeyValueStore>,
    next_ticket: u64,
    pending: Option<u64>,
}

impl Session {
    /// Load the collection from `store`, seeding the sample scroll when the
    /// store has never been written and the config asks for it.
    pub fn open(store: Box<dyn KeyValueStore>, config: &ScrollsConfig) -> Result<Self> {
        let loaded = storage::load_notes(store.as_ref())?;
        let seeded = loaded.is_none() && config.seed_sample;
        let notes = match loaded {
            Some(notes) => notes,
            None if config.seed_sample => vec![sample_scroll(Utc::now())],
            None => Vec::new(),
        };
        info!(count = notes.len(), seeded, "Opened scrolls");

        let mut session = Self {
            state: AppState::new(notes, config.default_realm),
            store,
            next_ticket: 0,
            pending: None,
        };
        if seeded {
            session.persist()?;
        }
        Ok(session)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn notes(&self) -> &[Note] {
        self.state.notes()
    }

    pub fn selected(&self) -> Option<&Note> {
        self.state.selected()
    }

    /// Look a scroll up by id, list position or id prefix.
    pub fn resolve(&self, reference: &str) -> Result<&Note> {
        self.state.collection().resolve(reference)
    }

    pub fn dispatch(&mut self, action: Action) -> Result<Transition> {
        self.dispatch_at(action, Utc::now())
    }

    /// Apply `action` at `now` and persist if the collection changed.
    pub fn dispatch_at(&mut self, action: Action, now: DateTime<Utc>) -> Result<Transition> {
        let transition = self.state.apply(action, now);
        if transition.needs_persist() {
            self.persist()?;
        }
        Ok(transition)
    }

    /// Write the whole collection back to the store.
    ///
    /// Failures are returned; the in-memory state keeps the change so a later
    /// successful write catches up.
    pub fn persist(&mut self) -> Result<()> {
        storage::save_notes(self.store.as_mut(), self.state.notes()).map_err(|e| {
            error!(error = %e, "Failed to persist scrolls");
            e
        })
    }

    pub fn create(&mut self) -> Result<NoteId> {
        self.dispatch(Action::Create)?;
        self.state
            .collection()
            .selected_id()
            .cloned()
            .ok_or_else(|| ScrollError::Storage("Created scroll was not selected".to_string()))
    }

    /// Returns `false` when no scroll has `id`.
    pub fn update(&mut self, id: &NoteId, patch: NotePatch) -> Result<bool> {
        let transition = self.dispatch(Action::Update {
            id: id.clone(),
            patch,
        })?;
        Ok(transition == Transition::CollectionChanged)
    }

    /// Delete after asking `confirm`. Returns whether a scroll was removed.
    pub fn delete(&mut self, id: &NoteId, confirm: &mut dyn Confirm) -> Result<bool> {
        let Some(note) = self.state.collection().get(id) else {
            return Ok(false);
        };
        let confirmed = confirm.confirm(note);
        let transition = self.dispatch(Action::Delete {
            id: id.clone(),
            confirmed,
        })?;
        Ok(transition == Transition::CollectionChanged)
    }

    pub fn select(&mut self, id: NoteId) -> Result<()> {
        self.dispatch(Action::Select(id))?;
        Ok(())
    }

    /// Filter the collection without touching the view's query.
    pub fn search(&self, query: &str) -> Vec<&Note> {
        search::filter(self.state.notes(), query)
    }

    pub fn set_realm(&mut self, id: &NoteId, realm: Realm) -> Result<bool> {
        self.update(id, NotePatch::realm(realm))
    }

    /// Start a consultation about the selected scroll, superseding any still
    /// in flight.
    pub fn begin_consultation(&mut self, mode: ConsultMode) -> ConsultationTicket {
        self.next_ticket += 1;
        if let Some(stale) = self.pending.replace(self.next_ticket) {
            debug!(stale, superseded_by = self.next_ticket, "Superseding consultation");
        }
        ConsultationTicket {
            seq: self.next_ticket,
            mode,
            target: self.state.collection().selected_id().cloned(),
        }
    }

    /// Close `ticket`; `false` means a newer consultation replaced it and its
    /// result must be dropped.
    pub fn finish_consultation(&mut self, ticket: &ConsultationTicket) -> bool {
        if self.pending == Some(ticket.seq) {
            self.pending = None;
            true
        } else {
            warn!(ticket = ticket.seq, "Dropping stale consultation result");
            false
        }
    }

    pub fn is_consulting(&self) -> bool {
        self.pending.is_some()
    }

    /// Fold a reply into scroll `id`. Returns `false` when it no longer exists.
    pub fn apply_reply(&mut self, id: &NoteId, reply: &str) -> Result<bool> {
        let transition = self.dispatch(Action::ApplyReply {
            id: id.clone(),
            reply: reply.to_string(),
        })?;
        Ok(transition == Transition::CollectionChanged)
    }

    /// Consult the spirit about the selected scroll.
    ///
    /// With `apply`, polish and expand replies are written into the scroll;
    /// chat replies never are.
    pub async fn consult(
        &mut self,
        gateway: &SpiritGateway,
        prompt: &str,
        mode: ConsultMode,
        apply: bool,
    ) -> Result<ConsultationOutcome> {
        let prompt = mode.resolve_prompt(prompt).ok_or(ScrollError::EmptyPrompt)?;
        let context = self
            .selected()
            .map(|n| n.content.clone())
            .unwrap_or_default();

        let ticket = self.begin_consultation(mode);
        let scroll = ticket.target().cloned();
        let reply = gateway.consult(&prompt, &context, mode).await;
        let (_, applied) = self.complete_consultation(&ticket, &reply, apply)?;

        Ok(ConsultationOutcome {
            mode,
            prompt,
            reply,
            scroll,
            applied,
        })
    }

    /// Close `ticket` and, when asked to, fold `reply` into the scroll the
    /// ticket was issued for. Returns `(current, applied)`.
    ///
    /// Stale tickets, chat replies and the fallback reply are never applied,
    /// and neither is a reply whose scroll has been deleted meanwhile.
    pub fn complete_consultation(
        &mut self,
        ticket: &ConsultationTicket,
        reply: &str,
        apply: bool,
    ) -> Result<(bool, bool)> {
        let current = self.finish_consultation(ticket);
        if !(current && apply && ticket.mode.rewrites_scroll()) {
            return Ok((current, false));
        }
        if reply == FALLBACK_REPLY {
            warn!("Not inscribing the fallback reply");
            return Ok((current, false));
        }
        let Some(target) = ticket.target() else {
            return Ok((current, false));
        };
        let applied = self.apply_reply(target, reply)?;
        if !applied {
            warn!(id = %target, "Consulted scroll is gone; reply dropped");
        }
        Ok((current, applied))
    }
}

fn sample_scroll(now: DateTime<Utc>) -> Note {
    let mut note = Note::new(NoteId::generate(|_| false), Realm::Foundation, now);
    note.title = SAMPLE_TITLE.to_string();
    note.content = SAMPLE_CONTENT.to_string();
    note
}
