//! MCP (Model Context Protocol) server for the scroll journal.
//!
//! Exposes the same actions as the CLI (create, select, update, delete,
//! search, consult, apply) as tools, so AI clients can drive the journal.

pub mod error;
pub mod tools;

use crate::entity::{Note, NotePatch};
use crate::search;
use crate::session::Session;
use crate::spirit::SpiritGateway;
use error::{validation, McpError};
use rmcp::{
    handler::server::wrapper::Parameters, model::*, service::RoleServer, tool, tool_handler,
    tool_router, ErrorData as McpErrorData, ServerHandler,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tools::*;
use tracing::{debug, info};

/// The MCP server.
///
/// Holds the session behind an async mutex. The lock is never held across a
/// spirit consultation.
#[derive(Clone)]
pub struct ScrollsServer {
    pub session: Arc<Mutex<Session>>,
    pub gateway: SpiritGateway,
    /// Tool router for MCP tool handling.
    pub tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpErrorData> {
    let json = serde_json::to_string_pretty(value).map_err(|e| McpError::InternalError {
        message: format!("Failed to serialize response: {}", e),
    })?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Response for `note` as it sits in `session` right now.
fn respond_with(session: &Session, note: &Note) -> NoteResponse {
    let position = session
        .notes()
        .iter()
        .position(|n| n.id == note.id)
        .map_or(0, |p| p + 1);
    let selected = session.selected().is_some_and(|s| s.id == note.id);
    note_to_response(note, position, selected)
}

#[tool_router]
impl ScrollsServer {
    pub fn new(session: Session, gateway: SpiritGateway) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            gateway,
            tool_router: Self::tool_router(),
        }
    }

    /// Start the MCP server on the given transport.
    ///
    /// Runs until the transport is closed or an error occurs.
    pub async fn serve<T, E, A>(self, transport: T) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        T: rmcp::transport::IntoTransport<RoleServer, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        use rmcp::service::ServiceExt;
        info!("Starting MCP server");
        let running = ServiceExt::serve(self, transport).await.map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        running.waiting().await.map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        Ok(())
    }

    /// Ping tool for health checks.
    #[tool(description = "Check if the server is running")]
    async fn ping(&self) -> Result<CallToolResult, McpErrorData> {
        Ok(CallToolResult::success(vec![Content::text("pong")]))
    }

    // ========================================================================
    // note_create
    // ========================================================================

    #[tool(description = "Inscribe a new scroll at the top of the list and select it")]
    pub async fn note_create(
        &self,
        Parameters(params): Parameters<NoteCreateParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        validate_title(&params.title)?;
        validate_content(&params.content)?;
        let realm = parse_optional_realm(&params.realm)?;

        let mut session = self.session.lock().await;
        let id = session.create().map_err(McpError::from)?;
        let patch = NotePatch {
            title: params.title,
            content: params.content,
            realm,
        };
        if !patch.is_empty() {
            session.update(&id, patch).map_err(McpError::from)?;
        }

        let note = session.resolve(id.as_str()).map_err(McpError::from)?;
        to_json(&respond_with(&session, note))
    }

    // ========================================================================
    // note_list
    // ========================================================================

    #[tool(description = "List scrolls newest first, optionally filtered by realm, with pagination")]
    pub async fn note_list(
        &self,
        Parameters(params): Parameters<NoteListParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let realm = parse_optional_realm(&params.realm)?;
        let limit = params
            .limit
            .unwrap_or(validation::DEFAULT_LIMIT as u32)
            .min(validation::MAX_LIMIT as u32) as usize;
        let offset = params.offset.unwrap_or(0) as usize;

        let session = self.session.lock().await;
        let notes: Vec<NoteResponse> = search::filter_by_realm(session.search(""), realm)
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|n| respond_with(&session, n))
            .collect();
        to_json(&notes)
    }

    // ========================================================================
    // note_get / note_select
    // ========================================================================

    #[tool(description = "Get a scroll by id, list position like '2', or id prefix")]
    pub async fn note_get(
        &self,
        Parameters(params): Parameters<NoteRefParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let session = self.session.lock().await;
        let note = session.resolve(&params.id).map_err(McpError::from)?;
        to_json(&respond_with(&session, note))
    }

    #[tool(description = "Select a scroll; consultations without an explicit id use the selection")]
    pub async fn note_select(
        &self,
        Parameters(params): Parameters<NoteRefParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let mut session = self.session.lock().await;
        let id = session.resolve(&params.id).map_err(McpError::from)?.id.clone();
        session.select(id.clone()).map_err(McpError::from)?;
        let note = session.resolve(id.as_str()).map_err(McpError::from)?;
        to_json(&respond_with(&session, note))
    }

    // ========================================================================
    // note_update
    // ========================================================================

    #[tool(description = "Update a scroll's title, content or realm; omitted fields are left alone")]
    pub async fn note_update(
        &self,
        Parameters(params): Parameters<NoteUpdateParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        validate_title(&params.title)?;
        validate_content(&params.content)?;
        let realm = parse_optional_realm(&params.realm)?;
        let patch = NotePatch {
            title: params.title,
            content: params.content,
            realm,
        };
        if patch.is_empty() {
            return Err(McpError::ValidationFailed {
                field: "id".to_string(),
                message: "Nothing to update; pass title, content or realm".to_string(),
            }
            .into());
        }

        let mut session = self.session.lock().await;
        let id = session.resolve(&params.id).map_err(McpError::from)?.id.clone();
        session.update(&id, patch).map_err(McpError::from)?;
        let note = session.resolve(id.as_str()).map_err(McpError::from)?;
        to_json(&respond_with(&session, note))
    }

    // ========================================================================
    // note_delete
    // ========================================================================

    #[tool(description = "Shatter a scroll permanently. Requires confirm: true")]
    pub async fn note_delete(
        &self,
        Parameters(params): Parameters<NoteDeleteParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let mut session = self.session.lock().await;
        let id = session.resolve(&params.id).map_err(McpError::from)?.id.clone();

        let confirm = params.confirm;
        let removed = session
            .delete(&id, &mut |_: &Note| confirm)
            .map_err(McpError::from)?;

        let message = if removed {
            format!("Scroll {} shattered", id)
        } else {
            format!("Scroll {} kept; pass confirm: true to delete it", id)
        };
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    // ========================================================================
    // note_search
    // ========================================================================

    #[tool(description = "Case-insensitive search over scroll titles and content")]
    pub async fn note_search(
        &self,
        Parameters(params): Parameters<NoteSearchParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let realm = parse_optional_realm(&params.realm)?;
        let session = self.session.lock().await;
        let results: Vec<NoteResponse> = search::filter_by_realm(session.search(&params.query), realm)
            .into_iter()
            .map(|n| respond_with(&session, n))
            .collect();
        to_json(&results)
    }

    // ========================================================================
    // spirit_consult / spirit_apply
    // ========================================================================

    #[tool(
        description = "Consult the scroll spirit about a scroll. Modes: chat, polish, expand. With apply, polish/expand replies are written into the scroll"
    )]
    pub async fn spirit_consult(
        &self,
        Parameters(params): Parameters<SpiritConsultParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        validate_prompt(&params.prompt)?;
        let mode = parse_mode(&params.mode)?;
        let prompt = mode
            .resolve_prompt(params.prompt.as_deref().unwrap_or_default())
            .ok_or(McpError::PromptRequired)?;

        let (ticket, context) = {
            let mut session = self.session.lock().await;
            if let Some(reference) = &params.id {
                let id = session.resolve(reference).map_err(McpError::from)?.id.clone();
                session.select(id).map_err(McpError::from)?;
            }
            let context = session
                .selected()
                .map(|n| n.content.clone())
                .unwrap_or_default();
            (session.begin_consultation(mode), context)
        };

        let reply = self.gateway.consult(&prompt, &context, mode).await;

        let mut session = self.session.lock().await;
        let (current, applied) = session
            .complete_consultation(&ticket, &reply, params.apply)
            .map_err(McpError::from)?;
        if !current {
            debug!(%mode, "Consultation superseded");
        }

        to_json(&ConsultResponse {
            mode: mode.to_string(),
            prompt,
            reply,
            applied,
            superseded: !current,
        })
    }

    #[tool(description = "Fold a spirit reply into a scroll, after a blank line")]
    pub async fn spirit_apply(
        &self,
        Parameters(params): Parameters<SpiritApplyParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        validate_content(&Some(params.reply.clone()))?;

        let mut session = self.session.lock().await;
        if let Some(reference) = &params.id {
            let id = session.resolve(reference).map_err(McpError::from)?.id.clone();
            session.select(id).map_err(McpError::from)?;
        }
        let id = session
            .selected()
            .map(|n| n.id.clone())
            .ok_or(McpError::NothingSelected)?;

        session.apply_reply(&id, &params.reply).map_err(McpError::from)?;
        let note = session.resolve(id.as_str()).map_err(McpError::from)?;
        to_json(&respond_with(&session, note))
    }
}

#[tool_handler]
impl ServerHandler for ScrollsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Spirit Scrolls is a cultivation journal. Use note tools to inscribe, \
                 list, select, edit, search and shatter scrolls (notes tagged with a \
                 cultivation realm). Use spirit_consult to ask the scroll spirit to chat \
                 about, polish or expand the selected scroll, and spirit_apply to write \
                 a reply into it."
                    .to_string(),
            ),
        }
    }
}
