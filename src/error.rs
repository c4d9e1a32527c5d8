use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrollError {
    #[error("Not in a scrolls project. Run 'spirit-scrolls init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .scrolls/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Scroll not found: {0}")]
    NoteNotFound(String),

    #[error("Ambiguous scroll id '{0}' matches more than one scroll")]
    AmbiguousId(String),

    #[error("Invalid realm: {0}")]
    InvalidRealm(String),

    #[error("A question is required when chatting with the spirit")]
    EmptyPrompt,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, ScrollError>;
