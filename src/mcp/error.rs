//! MCP-specific error types and mapping to JSON-RPC error codes.

use crate::error::ScrollError;
use rmcp::model::ErrorCode;
use rmcp::ErrorData as RmcpError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Custom MCP error codes (in the -32000 to -32099 range for server errors)
pub mod error_codes {
    pub const NOTE_NOT_FOUND: i32 = -32001;
    pub const AMBIGUOUS_ID: i32 = -32002;
    pub const VALIDATION_FAILED: i32 = -32003;
    pub const NOT_INITIALIZED: i32 = -32004;
    pub const STORAGE_ERROR: i32 = -32010;
    pub const INTERNAL_ERROR: i32 = -32011;
}

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum McpError {
    #[error("Scroll not found: {id}")]
    NoteNotFound { id: String },

    #[error("Ambiguous scroll id '{id}' matches more than one scroll")]
    AmbiguousId { id: String },

    #[error("No scroll is selected")]
    NothingSelected,

    #[error("Validation failed for field '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Title too long: {actual} characters (max {max})")]
    TitleTooLong { max: usize, actual: usize },

    #[error("Content too large: {actual} bytes (max {max})")]
    ContentTooLarge { max: usize, actual: usize },

    #[error("Invalid value '{value}' for field '{field}'. Valid values: {}", valid.join(", "))]
    InvalidEnumValue {
        field: String,
        value: String,
        valid: Vec<String>,
    },

    #[error("A prompt is required in chat mode")]
    PromptRequired,

    #[error("Not in a scrolls project: {message}")]
    NotInitialized { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl McpError {
    /// Get the JSON-RPC error code for this error type.
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::NoteNotFound { .. } | McpError::NothingSelected => {
                error_codes::NOTE_NOT_FOUND
            }
            McpError::AmbiguousId { .. } => error_codes::AMBIGUOUS_ID,
            McpError::ValidationFailed { .. }
            | McpError::TitleTooLong { .. }
            | McpError::ContentTooLarge { .. }
            | McpError::InvalidEnumValue { .. }
            | McpError::PromptRequired => error_codes::VALIDATION_FAILED,
            McpError::NotInitialized { .. } => error_codes::NOT_INITIALIZED,
            McpError::StorageError { .. } => error_codes::STORAGE_ERROR,
            McpError::InternalError { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            McpError::NoteNotFound { .. } => "NoteNotFound",
            McpError::AmbiguousId { .. } => "AmbiguousId",
            McpError::NothingSelected => "NothingSelected",
            McpError::ValidationFailed { .. } => "ValidationFailed",
            McpError::TitleTooLong { .. } => "TitleTooLong",
            McpError::ContentTooLarge { .. } => "ContentTooLarge",
            McpError::InvalidEnumValue { .. } => "InvalidEnumValue",
            McpError::PromptRequired => "PromptRequired",
            McpError::NotInitialized { .. } => "NotInitialized",
            McpError::StorageError { .. } => "StorageError",
            McpError::InternalError { .. } => "InternalError",
        }
    }

    /// Convert to rmcp ErrorData for JSON-RPC response.
    pub fn to_rmcp_error(&self) -> RmcpError {
        RmcpError {
            code: ErrorCode(self.error_code()),
            message: self.to_string().into(),
            data: Some(json!({
                "error_type": self.error_type(),
                "details": self.clone()
            })),
        }
    }
}

impl From<McpError> for RmcpError {
    fn from(err: McpError) -> Self {
        err.to_rmcp_error()
    }
}

impl From<ScrollError> for McpError {
    fn from(err: ScrollError) -> Self {
        match err {
            ScrollError::NotInitialized | ScrollError::AlreadyInitialized => {
                McpError::NotInitialized {
                    message: err.to_string(),
                }
            }
            ScrollError::NoteNotFound(id) => McpError::NoteNotFound { id },
            ScrollError::AmbiguousId(id) => McpError::AmbiguousId { id },
            ScrollError::InvalidRealm(value) => McpError::InvalidEnumValue {
                field: "realm".to_string(),
                value,
                valid: validation::realm_values(),
            },
            ScrollError::EmptyPrompt => McpError::PromptRequired,
            ScrollError::Config(message) => McpError::ValidationFailed {
                field: "config".to_string(),
                message,
            },
            ScrollError::Storage(message) => McpError::StorageError { message },
            ScrollError::Io(e) => McpError::StorageError {
                message: format!("IO error: {}", e),
            },
            ScrollError::Sqlite(e) => McpError::StorageError {
                message: format!("SQLite error: {}", e),
            },
            ScrollError::Json(e) => McpError::InternalError {
                message: format!("JSON error: {}", e),
            },
            ScrollError::Yaml(e) => McpError::InternalError {
                message: format!("YAML error: {}", e),
            },
        }
    }
}

/// Validation constants.
pub mod validation {
    use crate::entity::Realm;

    pub const MAX_TITLE_LENGTH: usize = 500;
    pub const MAX_CONTENT_SIZE: usize = 102_400; // 100KB
    pub const MAX_PROMPT_SIZE: usize = 10_240; // 10KB
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 100;

    pub const VALID_MODES: &[&str] = &["chat", "polish", "expand"];

    pub fn realm_values() -> Vec<String> {
        Realm::ALL.iter().map(|r| r.label().to_string()).collect()
    }
}
