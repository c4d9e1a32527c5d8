//! The scroll spirit (器灵): consultation with a generative-text provider.
//!
//! [`SpiritGateway::consult`] builds the persona and request text for a
//! [`ConsultMode`], forwards it to a [`GenerativeProvider`], and turns every
//! outcome into plain text. Failures are logged and replaced by
//! [`FALLBACK_REPLY`]; nothing is raised past the gateway.

mod gateway;
mod gemini;
mod mode;
mod provider;

pub use gateway::SpiritGateway;
pub use gemini::GeminiProvider;
pub use mode::{
    build_contents, ConsultMode, DEFAULT_EXPAND_PROMPT, DEFAULT_POLISH_PROMPT, FALLBACK_REPLY,
    GREETING, PERSONA, SILENT_REPLY,
};
pub use provider::{GenerationRequest, GenerativeProvider, ProviderError};
