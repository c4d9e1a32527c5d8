use async_trait::async_trait;
use thiserror::Error;

/// One generation call: persona, combined text, sampling temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub contents: String,
    pub temperature: f32,
}

/// Failures inside a provider. They never leave the gateway.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("no API key configured (set GEMINI_API_KEY or API_KEY)")]
    MissingCredential,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Decode(String),
}

/// A generative-text backend.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Run one generation; an empty string means the provider said nothing.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;
}
