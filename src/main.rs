use clap::Parser;
use spirit_scrolls::cli::{
    handle_consult, handle_delete, handle_edit, handle_init, handle_list, handle_new,
    handle_search, handle_serve, handle_shell, handle_show, Cli, Commands,
};

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("spirit_scrolls=warn"));

    // stdout carries command output and the MCP stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            storage,
            default_realm,
            empty,
        } => handle_init(storage, default_realm, empty),
        Commands::New {
            title,
            realm,
            stdin,
            json,
        } => handle_new(title, realm, stdin, json),
        Commands::List { realm, json } => handle_list(realm, json),
        Commands::Show { id, json } => handle_show(id, json),
        Commands::Edit {
            id,
            title,
            realm,
            content,
            stdin,
            json,
        } => handle_edit(id, title, realm, content, stdin, json),
        Commands::Delete { id, force } => handle_delete(id, force),
        Commands::Search { query, realm, json } => handle_search(query, realm, json),
        Commands::Consult {
            prompt,
            mode,
            scroll,
            apply,
            json,
        } => handle_consult(prompt, mode, scroll, apply, json),
        Commands::Shell => handle_shell(),
        Commands::Serve => handle_serve(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
