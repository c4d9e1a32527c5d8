use std::env;
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use crate::config::{find_scrolls_dir, ScrollsConfig, SCROLLS_DIR};
use crate::entity::{Note, NotePatch, Realm};
use crate::error::{Result, ScrollError};
use crate::mcp::ScrollsServer;
use crate::search;
use crate::session::Session;
use crate::spirit::{ConsultMode, SpiritGateway};
use crate::storage::{open_store, StorageBackend};

use super::shell;

pub(crate) const EMPTY_LIBRARY: &str = "藏经阁空空如也，道友该开始修炼了。";
pub(crate) const DELETE_WARNING: &str = "道友确定要碎裂这枚玉简吗？此举将使其中经文灰飞烟灭，不可挽回。";

/// Locate `.scrolls/` from the current directory upwards and load its config.
fn open_project() -> Result<(PathBuf, ScrollsConfig)> {
    let cwd = env::current_dir()?;
    let dir = find_scrolls_dir(&cwd).ok_or(ScrollError::NotInitialized)?;
    let config = ScrollsConfig::load(&dir)?;
    Ok((dir, config))
}

fn open_session() -> Result<(Session, ScrollsConfig)> {
    let (dir, config) = open_project()?;
    let store = open_store(&dir, config.storage)?;
    let session = Session::open(store, &config)?;
    Ok((session, config))
}

fn build_gateway(config: &ScrollsConfig) -> Result<SpiritGateway> {
    SpiritGateway::from_config(&config.spirit).map_err(|e| ScrollError::Config(e.to_string()))
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

fn parse_realm(raw: &str) -> Result<Realm> {
    raw.parse().map_err(|_| ScrollError::InvalidRealm(raw.to_string()))
}

fn parse_optional_realm(raw: Option<String>) -> Result<Option<Realm>> {
    raw.as_deref().map(parse_realm).transpose()
}

fn read_stdin() -> Result<String> {
    let mut content = String::new();
    io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

/// One list row: position, short id, realm, title, last edit date.
pub(crate) fn format_row(position: usize, note: &Note, selected: bool) -> String {
    format!(
        "{} {:>3} ({}) [{}] {}  {}",
        if selected { '*' } else { ' ' },
        position,
        note.id.short(),
        note.realm,
        note.display_title(),
        note.updated_at.format("%Y-%m-%d")
    )
}

pub(crate) fn format_note(note: &Note) -> String {
    let mut out = format!(
        "{} [{}]\nid: {}\ncreated: {}\nupdated: {}\n",
        note.display_title(),
        note.realm,
        note.id,
        note.created_at.to_rfc3339(),
        note.updated_at.to_rfc3339()
    );
    if !note.content.is_empty() {
        out.push('\n');
        out.push_str(&note.content);
        out.push('\n');
    }
    out
}

/// List rows for `notes`, numbered by their position in the whole collection.
pub(crate) fn render_rows(notes: &[&Note], session: &Session) -> Vec<String> {
    let selected = session.selected().map(|n| &n.id);
    notes
        .iter()
        .map(|note| {
            let position = session
                .notes()
                .iter()
                .position(|n| n.id == note.id)
                .map_or(0, |p| p + 1);
            format_row(position, note, selected == Some(&note.id))
        })
        .collect()
}

fn print_rows(notes: &[&Note], session: &Session, empty_message: &str) {
    if notes.is_empty() {
        println!("{}", empty_message);
        return;
    }
    for row in render_rows(notes, session) {
        println!("{}", row);
    }
}

pub fn handle_init(storage: String, default_realm: Option<String>, empty: bool) -> Result<()> {
    let root = env::current_dir()?;
    let dir = root.join(SCROLLS_DIR);
    if dir.exists() {
        return Err(ScrollError::AlreadyInitialized);
    }

    let backend: StorageBackend = storage.parse().map_err(ScrollError::Config)?;
    let mut config = ScrollsConfig {
        storage: backend,
        seed_sample: !empty,
        ..ScrollsConfig::default()
    };
    if let Some(realm) = default_realm {
        config.default_realm = parse_realm(&realm)?;
    }

    fs::create_dir_all(&dir)?;
    config.save(&dir)?;

    let store = open_store(&dir, config.storage)?;
    let mut session = Session::open(store, &config)?;
    session.persist()?;

    println!("Initialized scrolls project in {}", root.display());
    println!("  storage: {}, scrolls: {}", config.storage, session.notes().len());
    Ok(())
}

pub fn handle_new(
    title: Option<String>,
    realm: Option<String>,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let realm = parse_optional_realm(realm)?;
    let (mut session, _config) = open_session()?;

    let content = if stdin {
        Some(read_stdin()?).filter(|c| !c.is_empty())
    } else {
        None
    };

    let id = session.create()?;
    let patch = NotePatch {
        title,
        content,
        realm,
    };
    if !patch.is_empty() {
        session.update(&id, patch)?;
    }

    let note = session.resolve(id.as_str())?;
    if json {
        println!("{}", serde_json::to_string_pretty(note)?);
    } else {
        println!("Inscribed scroll ({}) - {}", note.id.short(), note.display_title());
    }
    Ok(())
}

pub fn handle_list(realm: Option<String>, json: bool) -> Result<()> {
    let realm = parse_optional_realm(realm)?;
    let (session, _config) = open_session()?;
    let notes = search::filter_by_realm(session.search(""), realm);

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else {
        print_rows(&notes, &session, EMPTY_LIBRARY);
    }
    Ok(())
}

pub fn handle_show(id: String, json: bool) -> Result<()> {
    let (session, _config) = open_session()?;
    let note = session.resolve(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(note)?);
    } else {
        print!("{}", format_note(note));
    }
    Ok(())
}

pub fn handle_edit(
    id: String,
    title: Option<String>,
    realm: Option<String>,
    content: Option<String>,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let realm = parse_optional_realm(realm)?;
    let (mut session, _config) = open_session()?;
    let note_id = session.resolve(&id)?.id.clone();

    let content = if stdin { Some(read_stdin()?) } else { content };
    let patch = NotePatch {
        title,
        content,
        realm,
    };
    if patch.is_empty() {
        eprintln!("Nothing to change; pass --title, --realm, --content or --stdin");
        return Ok(());
    }
    session.update(&note_id, patch)?;

    let note = session.resolve(note_id.as_str())?;
    if json {
        println!("{}", serde_json::to_string_pretty(note)?);
    } else {
        println!("Updated scroll ({}) - {}", note.id.short(), note.display_title());
    }
    Ok(())
}

pub fn handle_delete(id: String, force: bool) -> Result<()> {
    let (mut session, _config) = open_session()?;
    let note = session.resolve(&id)?.clone();

    // Non-interactive mode without --force, abort
    if !force && !atty::is(atty::Stream::Stdin) {
        return Err(ScrollError::Storage(
            "Use --force to delete in non-interactive mode".to_string(),
        ));
    }

    let removed = session.delete(&note.id, &mut |n: &Note| {
        force || ask_to_delete(n, &mut io::stdin().lock(), &mut io::stderr())
    })?;

    if removed {
        println!("Deleted scroll ({}) - {}", note.id.short(), note.display_title());
    } else {
        println!("Cancelled.");
    }
    Ok(())
}

/// Ask on `output`, read the answer from `input`. Only "y" confirms.
pub(crate) fn ask_to_delete(note: &Note, input: &mut dyn BufRead, output: &mut dyn Write) -> bool {
    let _ = write!(
        output,
        "{}\nDelete ({}) - {}? [y/N] ",
        DELETE_WARNING,
        note.id.short(),
        note.display_title()
    );
    let _ = output.flush();

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
        Err(_) => false,
    }
}

pub fn handle_search(query: String, realm: Option<String>, json: bool) -> Result<()> {
    let realm = parse_optional_realm(realm)?;
    let (session, _config) = open_session()?;
    let results = search::filter_by_realm(session.search(&query), realm);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No scrolls found for '{}'.", query);
    } else {
        println!("Search results for '{}':\n", query);
        print_rows(&results, &session, "");
    }
    Ok(())
}

pub fn handle_consult(
    prompt: Option<String>,
    mode: String,
    scroll: Option<String>,
    apply: bool,
    json: bool,
) -> Result<()> {
    let mode: ConsultMode = mode.parse().map_err(ScrollError::Config)?;
    let (mut session, config) = open_session()?;
    if let Some(reference) = scroll {
        let id = session.resolve(&reference)?.id.clone();
        session.select(id)?;
    }
    let gateway = build_gateway(&config)?;

    let prompt = prompt.unwrap_or_default();
    let outcome = block_on(session.consult(&gateway, &prompt, mode, apply))??;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("{}", outcome.reply);
    if outcome.applied {
        if let Some(note) = session.selected() {
            eprintln!("Inscribed into scroll ({}) - {}", note.id.short(), note.display_title());
        }
    } else if apply && !mode.rewrites_scroll() {
        eprintln!("Chat replies are not written into scrolls");
    }
    Ok(())
}

pub fn handle_shell() -> Result<()> {
    let (session, config) = open_session()?;
    let gateway = build_gateway(&config)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    shell::run(session, &gateway, &mut stdin.lock(), &mut stdout.lock())
}

pub fn handle_serve() -> Result<()> {
    let (session, config) = open_session()?;
    let gateway = build_gateway(&config)?;
    let server = ScrollsServer::new(session, gateway);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime
        .block_on(server.serve(rmcp::transport::stdio()))
        .map_err(|e| ScrollError::Storage(format!("MCP server error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::NoteId;
    use chrono::Utc;
    use std::io::Cursor;

    fn note(title: &str) -> Note {
        let mut n = Note::new(NoteId::from("0190abcdef"), Realm::GoldenCore, Utc::now());
        n.title = title.to_string();
        n
    }

    #[test]
    fn test_ask_to_delete_accepts_only_y() {
        let n = note("金丹");
        let mut out = Vec::new();
        assert!(ask_to_delete(&n, &mut Cursor::new("y\n"), &mut out));
        assert!(ask_to_delete(&n, &mut Cursor::new("Y\n"), &mut Vec::new()));
        assert!(!ask_to_delete(&n, &mut Cursor::new("yes please\n"), &mut Vec::new()));
        assert!(!ask_to_delete(&n, &mut Cursor::new(""), &mut Vec::new()));

        let prompt = String::from_utf8(out).unwrap();
        assert!(prompt.contains("碎裂"));
        assert!(prompt.contains("0190abc"));
    }

    #[test]
    fn test_format_row_uses_placeholder_title() {
        let row = format_row(2, &note(""), true);
        assert!(row.starts_with('*'));
        assert!(row.contains("  2 (0190abc) [金丹期] 无名经文"));
    }

    #[test]
    fn test_format_note_includes_content() {
        let mut n = note("金丹");
        n.content = "九转还丹".to_string();
        let text = format_note(&n);
        assert!(text.starts_with("金丹 [金丹期]"));
        assert!(text.ends_with("九转还丹\n"));
    }
}
