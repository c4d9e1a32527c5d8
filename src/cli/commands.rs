use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "spirit-scrolls")]
#[command(version, about = "A cultivation-scroll journal with an AI spirit")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a scrolls project in the current directory
    Init {
        /// Storage backend (json, sqlite)
        #[arg(long, default_value = "json")]
        storage: String,

        /// Realm new scrolls start in
        #[arg(long)]
        default_realm: Option<String>,

        /// Start without the sample scroll
        #[arg(long)]
        empty: bool,
    },

    /// Inscribe a new scroll
    New {
        /// Scroll title
        #[arg(long, short = 't')]
        title: Option<String>,

        /// Realm (炼气期, 筑基期, ... or qi-condensation, foundation, ...)
        #[arg(long, short = 'r')]
        realm: Option<String>,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List scrolls, newest first
    List {
        /// Only scrolls in this realm
        #[arg(long, short = 'r')]
        realm: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single scroll
    Show {
        /// Scroll id, list position like "2", or id prefix
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit a scroll's title, realm or content
    Edit {
        /// Scroll id, list position, or id prefix
        id: String,

        /// New title
        #[arg(long, short = 't')]
        title: Option<String>,

        /// New realm
        #[arg(long, short = 'r')]
        realm: Option<String>,

        /// New content
        #[arg(long, short = 'c', conflicts_with = "stdin")]
        content: Option<String>,

        /// Read new content from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Shatter a scroll (asks for confirmation)
    Delete {
        /// Scroll id, list position, or id prefix
        id: String,

        /// Skip confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Search titles and content, ignoring case
    Search {
        /// Text to look for
        query: String,

        /// Only scrolls in this realm
        #[arg(long, short = 'r')]
        realm: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Consult the scroll spirit
    Consult {
        /// Question or request (optional for polish and expand)
        prompt: Option<String>,

        /// chat, polish or expand
        #[arg(long, short = 'm', default_value = "chat")]
        mode: String,

        /// Scroll to consult about (defaults to the newest)
        #[arg(long, short = 's')]
        scroll: Option<String>,

        /// Write a polish/expand reply into the scroll
        #[arg(long)]
        apply: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive session that keeps selection and view state
    Shell,

    /// Start the MCP server on stdio
    Serve,
}
