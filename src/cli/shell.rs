//! Line-oriented interactive session.
//!
//! Unlike the one-shot commands, the shell keeps a single [`Session`] alive,
//! so selection, the search query, the sidebar and the consultation panel
//! behave the way they do in the journal view.

use std::io::{BufRead, Write};

use chrono::Utc;

use crate::entity::{Note, NoteId, NotePatch, Realm};
use crate::error::{Result, ScrollError};
use crate::session::Session;
use crate::spirit::{ConsultMode, SpiritGateway, FALLBACK_REPLY, GREETING};
use crate::state::Action;

use super::handlers::{ask_to_delete, format_note, render_rows, EMPTY_LIBRARY};

const PROMPT: &str = "道友> ";

const HELP: &str = "\
Commands:
  list | ls                 list scrolls (filtered by the current search)
  new                       inscribe a blank scroll and select it
  select <ref>              select by id, list position or id prefix
  show                      show the selected scroll
  title <text>              retitle the selected scroll
  realm <realm>             change the selected scroll's realm
  write <text>              replace the selected scroll's content (\\n for newlines)
  search [query]            filter the list; no query clears the filter
  delete [ref]              shatter a scroll (asks first)
  consult <mode> [prompt]   ask the spirit (chat, polish, expand)
  apply                     write the last polish/expand reply into the scroll
  close                     close the consultation panel
  sidebar                   show or hide the list
  help                      this text
  quit | exit               leave";

enum Flow {
    Continue,
    Quit,
}

struct Shell<'g> {
    session: Session,
    gateway: &'g SpiritGateway,
    runtime: tokio::runtime::Runtime,
    /// Last polish/expand reply not yet applied, with the scroll it is for.
    pending_reply: Option<(NoteId, String)>,
}

/// Run the shell until `quit` or end of input.
pub fn run<R: BufRead, W: Write>(
    session: Session,
    gateway: &SpiritGateway,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut shell = Shell {
        session,
        gateway,
        runtime,
        pending_reply: None,
    };

    writeln!(output, "Type 'help' for commands.")?;
    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(());
        }

        match shell.execute(line.trim(), input, output) {
            Ok(Flow::Quit) => return Ok(()),
            Ok(Flow::Continue) => {}
            Err(ScrollError::Io(e)) => return Err(ScrollError::Io(e)),
            Err(e) => writeln!(output, "Error: {}", e)?,
        }
        if shell.session.state().view().is_saving(Utc::now()) {
            writeln!(output, "封印中...")?;
        }
    }
}

impl Shell<'_> {
    fn execute<R: BufRead, W: Write>(
        &mut self,
        line: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<Flow> {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "list" | "ls" => self.list(output)?,
            "new" => {
                self.session.create()?;
                self.show_selected(output)?;
            }
            "select" => {
                let id = self.session.resolve(rest)?.id.clone();
                self.session.select(id)?;
                self.show_selected(output)?;
            }
            "show" => self.show_selected(output)?,
            "title" => {
                let id = self.selected_id()?;
                self.session.update(&id, NotePatch::title(rest))?;
            }
            "realm" => {
                let realm: Realm = rest
                    .parse()
                    .map_err(|_| ScrollError::InvalidRealm(rest.to_string()))?;
                let id = self.selected_id()?;
                self.session.set_realm(&id, realm)?;
            }
            "write" => {
                let id = self.selected_id()?;
                self.session
                    .update(&id, NotePatch::content(rest.replace("\\n", "\n")))?;
            }
            "search" => {
                self.session.dispatch(Action::Search(rest.to_string()))?;
                self.list(output)?;
            }
            "delete" => self.delete(rest, input, output)?,
            "consult" => self.consult(rest, output)?,
            "apply" => match self.pending_reply.take() {
                Some((id, reply)) => {
                    if self.session.apply_reply(&id, &reply)? {
                        writeln!(output, "Inscribed into scroll ({}).", id.short())?;
                    } else {
                        writeln!(output, "The consulted scroll is gone.")?;
                    }
                    self.session.dispatch(Action::CloseConsultation)?;
                }
                None => writeln!(output, "Nothing to apply.")?,
            },
            "close" => {
                self.pending_reply = None;
                self.session.dispatch(Action::CloseConsultation)?;
            }
            "sidebar" => {
                self.session.dispatch(Action::ToggleSidebar)?;
                let open = self.session.state().view().sidebar_open;
                writeln!(output, "Sidebar {}.", if open { "shown" } else { "hidden" })?;
            }
            "help" => writeln!(output, "{}", HELP)?,
            "quit" | "exit" => return Ok(Flow::Quit),
            other => writeln!(output, "Unknown command '{}'. Type 'help'.", other)?,
        }
        Ok(Flow::Continue)
    }

    fn selected_id(&self) -> Result<NoteId> {
        self.session
            .selected()
            .map(|n| n.id.clone())
            .ok_or_else(|| ScrollError::NoteNotFound("no scroll selected".to_string()))
    }

    fn list<W: Write>(&self, output: &mut W) -> Result<()> {
        let view = self.session.state().view();
        if !view.sidebar_open {
            writeln!(output, "(sidebar hidden)")?;
            return Ok(());
        }
        let visible = self.session.state().visible_notes();
        if visible.is_empty() {
            if view.query.is_empty() {
                writeln!(output, "{}", EMPTY_LIBRARY)?;
            } else {
                writeln!(output, "No scrolls found for '{}'.", view.query)?;
            }
            return Ok(());
        }
        for row in render_rows(&visible, &self.session) {
            writeln!(output, "{}", row)?;
        }
        Ok(())
    }

    fn show_selected<W: Write>(&self, output: &mut W) -> Result<()> {
        match self.session.selected() {
            Some(note) => write!(output, "{}", format_note(note))?,
            None => writeln!(output, "{}", EMPTY_LIBRARY)?,
        }
        Ok(())
    }

    fn delete<R: BufRead, W: Write>(&mut self, reference: &str, input: &mut R, output: &mut W) -> Result<()> {
        let id = if reference.is_empty() {
            self.selected_id()?
        } else {
            self.session.resolve(reference)?.id.clone()
        };

        let removed = self
            .session
            .delete(&id, &mut |n: &Note| ask_to_delete(n, &mut *input, &mut *output))?;
        if removed {
            writeln!(output, "The scroll crumbles to dust.")?;
        } else {
            writeln!(output, "Cancelled.")?;
        }
        Ok(())
    }

    fn consult<W: Write>(&mut self, args: &str, output: &mut W) -> Result<()> {
        let (mode, prompt) = match args.split_once(char::is_whitespace) {
            Some((mode, prompt)) => (mode, prompt.trim()),
            None => (args, ""),
        };
        let mode: ConsultMode = if mode.is_empty() {
            ConsultMode::Chat
        } else {
            mode.parse().map_err(ScrollError::Config)?
        };

        if !self.session.state().view().consultation_open {
            self.session.dispatch(Action::OpenConsultation)?;
            writeln!(output, "{}", GREETING)?;
        }

        let outcome = self
            .runtime
            .block_on(self.session.consult(self.gateway, prompt, mode, false))?;
        writeln!(output, "{}", outcome.reply)?;

        self.pending_reply = match outcome.scroll {
            Some(id) if mode.rewrites_scroll() && outcome.reply != FALLBACK_REPLY => {
                Some((id, outcome.reply))
            }
            _ => None,
        };
        if self.pending_reply.is_some() {
            writeln!(output, "(type 'apply' to inscribe this into the scroll)")?;
        }
        Ok(())
    }
}
