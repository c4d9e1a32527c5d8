//! MCP tool types and helpers.
//!
//! Parameter types, response types and validation helpers for the tools. The
//! tool implementations live in mod.rs within the #[tool_router] impl block.

use crate::entity::{Note, Realm};
use crate::mcp::error::{validation, McpError};
use crate::spirit::ConsultMode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Parameter and Result Types
// ============================================================================

/// Parameters for note_create tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoteCreateParams {
    /// Optional title; empty scrolls show as 无名经文
    pub title: Option<String>,
    /// Optional content
    pub content: Option<String>,
    /// Realm label (炼气期 ... 大乘期) or alias (qi-condensation ... mahayana)
    pub realm: Option<String>,
}

/// Parameters for note_get and note_select tools
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NoteRefParams {
    /// Scroll id, list position like "2", or id prefix
    pub id: String,
}

/// Parameters for note_list tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoteListParams {
    /// Filter by realm
    pub realm: Option<String>,
    /// Maximum results (default 50, max 100)
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

/// Parameters for note_update tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoteUpdateParams {
    /// Scroll to update
    pub id: String,
    /// New title
    pub title: Option<String>,
    /// New content (replaces the old content)
    pub content: Option<String>,
    /// New realm
    pub realm: Option<String>,
}

/// Parameters for note_delete tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NoteDeleteParams {
    /// Scroll to shatter
    pub id: String,
    /// Must be true; deletion cannot be undone
    #[serde(default)]
    pub confirm: bool,
}

/// Parameters for note_search tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NoteSearchParams {
    /// Case-insensitive text matched against title and content
    pub query: String,
    /// Filter by realm
    pub realm: Option<String>,
}

/// Parameters for spirit_consult tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SpiritConsultParams {
    /// Question or request; optional for polish and expand
    pub prompt: Option<String>,
    /// chat (default), polish or expand
    pub mode: Option<String>,
    /// Scroll to consult about; selects it first. Defaults to the selected scroll
    pub id: Option<String>,
    /// Write a polish/expand reply into the scroll
    #[serde(default)]
    pub apply: bool,
}

/// Parameters for spirit_apply tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SpiritApplyParams {
    /// Reply text to fold into the scroll
    pub reply: String,
    /// Target scroll; defaults to the selected scroll
    pub id: Option<String>,
}

/// A serializable scroll response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteResponse {
    pub id: String,
    /// 1-based position in the newest-first list
    pub position: usize,
    /// Stored title, empty when the scroll is untitled
    pub title: String,
    /// Title as the list shows it
    pub display_title: String,
    pub realm: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultResponse {
    pub mode: String,
    pub prompt: String,
    pub reply: String,
    pub applied: bool,
    /// A newer consultation started while this one was in flight
    pub superseded: bool,
}

// ============================================================================
// Validation Helpers
// ============================================================================

pub fn validate_title(title: &Option<String>) -> Result<(), McpError> {
    if let Some(t) = title {
        let len = t.chars().count();
        if len > validation::MAX_TITLE_LENGTH {
            return Err(McpError::TitleTooLong {
                max: validation::MAX_TITLE_LENGTH,
                actual: len,
            });
        }
    }
    Ok(())
}

pub fn validate_content(content: &Option<String>) -> Result<(), McpError> {
    if let Some(c) = content {
        if c.len() > validation::MAX_CONTENT_SIZE {
            return Err(McpError::ContentTooLarge {
                max: validation::MAX_CONTENT_SIZE,
                actual: c.len(),
            });
        }
    }
    Ok(())
}

pub fn validate_prompt(prompt: &Option<String>) -> Result<(), McpError> {
    if let Some(p) = prompt {
        if p.len() > validation::MAX_PROMPT_SIZE {
            return Err(McpError::ValidationFailed {
                field: "prompt".to_string(),
                message: format!(
                    "Prompt exceeds maximum size of {}",
                    validation::MAX_PROMPT_SIZE
                ),
            });
        }
    }
    Ok(())
}

pub fn parse_realm(value: &str) -> Result<Realm, McpError> {
    value.parse().map_err(|_| McpError::InvalidEnumValue {
        field: "realm".to_string(),
        value: value.to_string(),
        valid: validation::realm_values(),
    })
}

pub fn parse_optional_realm(value: &Option<String>) -> Result<Option<Realm>, McpError> {
    value.as_deref().map(parse_realm).transpose()
}

pub fn parse_mode(value: &Option<String>) -> Result<ConsultMode, McpError> {
    match value.as_deref() {
        None => Ok(ConsultMode::Chat),
        Some(v) => v.parse().map_err(|_| McpError::InvalidEnumValue {
            field: "mode".to_string(),
            value: v.to_string(),
            valid: validation::VALID_MODES.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

// ============================================================================
// Conversion Helpers
// ============================================================================

pub fn note_to_response(n: &Note, position: usize, selected: bool) -> NoteResponse {
    NoteResponse {
        id: n.id.to_string(),
        position,
        title: n.title.clone(),
        display_title: n.display_title().to_string(),
        realm: n.realm.label().to_string(),
        content: n.content.clone(),
        created_at: n.created_at.to_rfc3339(),
        updated_at: n.updated_at.to_rfc3339(),
        selected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::NoteId;
    use chrono::Utc;

    #[test]
    fn test_validate_title() {
        assert!(validate_title(&None).is_ok());
        assert!(validate_title(&Some(String::new())).is_ok());
        assert!(validate_title(&Some("经".repeat(500))).is_ok());
        assert!(validate_title(&Some("经".repeat(501))).is_err());
    }

    #[test]
    fn test_parse_realm() {
        assert_eq!(parse_realm("金丹期").unwrap(), Realm::GoldenCore);
        assert_eq!(parse_realm("nascent-soul").unwrap(), Realm::NascentSoul);
        assert!(parse_realm("仙帝").is_err());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode(&None).unwrap(), ConsultMode::Chat);
        assert_eq!(parse_mode(&Some("polish".to_string())).unwrap(), ConsultMode::Polish);
        assert!(matches!(
            parse_mode(&Some("divine".to_string())),
            Err(McpError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn test_note_to_response_keeps_empty_title() {
        let note = Note::new(NoteId::from("abc"), Realm::Mahayana, Utc::now());
        let response = note_to_response(&note, 3, true);
        assert_eq!(response.title, "");
        assert_eq!(response.display_title, "无名经文");
        assert_eq!(response.realm, "大乘期");
        assert_eq!(response.position, 3);
        assert!(response.selected);
    }
}
