use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn scrolls_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_spirit-scrolls"));
    cmd.current_dir(dir)
        .env_remove("GEMINI_API_KEY")
        .env_remove("API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn run(dir: &Path, args: &[&str]) -> Output {
    scrolls_cmd(dir).args(args).output().unwrap()
}

fn run_with_stdin(dir: &Path, args: &[&str], input: &str) -> Output {
    let mut child = scrolls_cmd(dir)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_init_creates_scrolls_directory_with_sample() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["init"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(tmp.path().join(".scrolls").exists());
    assert!(tmp.path().join(".scrolls/config.yaml").exists());
    assert!(tmp.path().join(".scrolls/spirit_scrolls_data.json").exists());

    let output = run(tmp.path(), &["list"]);
    assert!(output.status.success());
    let listing = stdout(&output);
    assert!(listing.contains("筑基心得"));
    assert!(listing.contains("[筑基期]"));
}

#[test]
fn test_init_twice_fails() {
    let tmp = TempDir::new().unwrap();

    run(tmp.path(), &["init"]);
    let output = run(tmp.path(), &["init"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Already initialized"));
}

#[test]
fn test_command_without_init_fails() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["list"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Not in a scrolls project"));
}

#[test]
fn test_commands_work_from_subdirectory() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init", "--empty"]);
    let nested = tmp.path().join("chapter/one");
    std::fs::create_dir_all(&nested).unwrap();

    let output = run(&nested, &["new", "--title", "洞府笔记"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(tmp.path(), &["list"]);
    assert!(stdout(&output).contains("洞府笔记"));
}

#[test]
fn test_full_scroll_workflow() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["init", "--empty"]);
    assert!(output.status.success());

    let output = run(tmp.path(), &["list"]);
    assert!(stdout(&output).contains("藏经阁空空如也"));

    // New scroll with content from stdin
    let output = run_with_stdin(
        tmp.path(),
        &["new", "--title", "金丹要诀", "--realm", "golden-core", "--stdin", "--json"],
        "九转还丹，凝结金丹。",
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let note: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(note["title"], "金丹要诀");
    assert_eq!(note["realm"], "金丹期");
    assert_eq!(note["content"], "九转还丹，凝结金丹。");
    let created_at = note["createdAt"].as_i64().unwrap();
    let id = note["id"].as_str().unwrap().to_string();

    // Second scroll goes to the top
    let output = run(tmp.path(), &["new", "--title", "元婴感悟", "--realm", "元婴期"]);
    assert!(output.status.success());

    let output = run(tmp.path(), &["list", "--json"]);
    let list: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["title"], "元婴感悟");
    assert_eq!(list[1]["id"], id.as_str());

    // Edit by list position
    let output = run(tmp.path(), &["edit", "2", "--content", "金丹大成", "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let edited: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(edited["id"], id.as_str());
    assert_eq!(edited["content"], "金丹大成");
    assert_eq!(edited["createdAt"].as_i64().unwrap(), created_at);
    assert!(edited["updatedAt"].as_i64().unwrap() >= created_at);

    // Show by id prefix
    let output = run(tmp.path(), &["show", &id[..13]]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("金丹大成"));

    // Search is case-insensitive and realm-filterable
    let output = run(tmp.path(), &["search", "金丹", "--json"]);
    let found: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(found.len(), 1);

    let output = run(tmp.path(), &["search", "", "--realm", "元婴期", "--json"]);
    let found: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["title"], "元婴感悟");

    // Delete needs --force without a terminal
    let output = run_with_stdin(tmp.path(), &["delete", &id], "y\n");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--force"));

    let output = run(tmp.path(), &["delete", &id, "--force"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(tmp.path(), &["list", "--json"]);
    let list: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "元婴感悟");
}

#[test]
fn test_invalid_realm_is_rejected() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init", "--empty"]);

    let output = run(tmp.path(), &["new", "--realm", "仙帝"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid realm"));
}

#[test]
fn test_sqlite_backend_round_trip() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["init", "--storage", "sqlite", "--empty"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(tmp.path().join(".scrolls/scrolls.db").exists());

    run(tmp.path(), &["new", "--title", "炼虚之道"]);
    let output = run(tmp.path(), &["list"]);
    assert!(stdout(&output).contains("炼虚之道"));
}

#[test]
fn test_legacy_data_is_read() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init", "--empty"]);
    std::fs::write(
        tmp.path().join(".scrolls/spirit_scrolls_data.json"),
        r#"[{"id":"1715000000000","title":"旧经文","content":"","realm":"化神期","createdAt":1715000000000,"updatedAt":1715000000000}]"#,
    )
    .unwrap();

    let output = run(tmp.path(), &["show", "1715000000000", "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let note: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(note["title"], "旧经文");
    assert_eq!(note["realm"], "化神期");
}

#[test]
fn test_consult_without_key_falls_back() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init"]);

    let output = run(tmp.path(), &["consult", "--mode", "polish", "--apply"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("神识连接中断"));

    // The fallback reply is never inscribed
    let output = run(tmp.path(), &["show", "1"]);
    assert!(stdout(&output).contains("筑基之法"));
    assert!(!stdout(&output).contains("神识连接中断"));
}

#[test]
fn test_consult_chat_requires_prompt() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init"]);

    let output = run(tmp.path(), &["consult"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("question is required"));
}
