use std::sync::Arc;

use tracing::{error, info};

use super::gemini::GeminiProvider;
use super::mode::{build_contents, ConsultMode, FALLBACK_REPLY, SILENT_REPLY};
use super::provider::{GenerationRequest, GenerativeProvider, ProviderError};
use crate::config::SpiritConfig;

/// Consultation boundary: always answers with text, never with an error.
#[derive(Clone)]
pub struct SpiritGateway {
    provider: Arc<dyn GenerativeProvider>,
    temperature: f32,
}

impl SpiritGateway {
    pub fn new(provider: Arc<dyn GenerativeProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
        }
    }

    pub fn from_config(config: &SpiritConfig) -> Result<Self, ProviderError> {
        let provider = GeminiProvider::new(config)?;
        Ok(Self::new(Arc::new(provider), config.temperature))
    }

    /// The request that `consult` would send.
    pub fn build_request(&self, prompt: &str, context: &str, mode: ConsultMode) -> GenerationRequest {
        GenerationRequest {
            system_instruction: mode.system_instruction(),
            contents: build_contents(context, prompt),
            temperature: self.temperature,
        }
    }

    /// Ask the spirit. `prompt` is sent as given; resolve defaults with
    /// [`ConsultMode::resolve_prompt`] first.
    pub async fn consult(&self, prompt: &str, context: &str, mode: ConsultMode) -> String {
        let request = self.build_request(prompt, context, mode);
        info!(
            provider = self.provider.name(),
            %mode,
            prompt_len = prompt.len(),
            context_len = context.len(),
            "Consulting spirit"
        );

        match self.provider.generate(&request).await {
            Ok(text) if text.is_empty() => SILENT_REPLY.to_string(),
            Ok(text) => text,
            Err(e) => {
                error!(provider = self.provider.name(), error = %e, "Spirit communication broken");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    enum Behaviour {
        Reply(&'static str),
        Fail,
    }

    struct ScriptedProvider {
        behaviour: Behaviour,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedProvider {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GenerativeProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
            self.seen.lock().unwrap().push(request.clone());
            match self.behaviour {
                Behaviour::Reply(text) => Ok(text.to_string()),
                Behaviour::Fail => Err(ProviderError::Status {
                    status: 503,
                    body: "overloaded".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_consult_returns_provider_text() {
        let provider = ScriptedProvider::new(Behaviour::Reply("道可道，非常道"));
        let gateway = SpiritGateway::new(provider.clone(), 0.8);

        let reply = gateway.consult("何为道？", "筑基之法", ConsultMode::Chat).await;

        assert_eq!(reply, "道可道，非常道");
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].contents, build_contents("筑基之法", "何为道？"));
        assert_eq!(seen[0].system_instruction, ConsultMode::Chat.system_instruction());
        assert_eq!(seen[0].temperature, 0.8);
    }

    #[tokio::test]
    async fn test_empty_reply_becomes_placeholder() {
        let gateway = SpiritGateway::new(ScriptedProvider::new(Behaviour::Reply("")), 0.8);
        let reply = gateway.consult("润色", "", ConsultMode::Polish).await;
        assert_eq!(reply, SILENT_REPLY);
    }

    #[tokio::test]
    async fn test_failure_becomes_fallback() {
        let gateway = SpiritGateway::new(ScriptedProvider::new(Behaviour::Fail), 0.8);
        let reply = gateway.consult("推演", "心魔", ConsultMode::Expand).await;
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_missing_key_becomes_fallback() {
        let gateway = SpiritGateway::from_config(&SpiritConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
            ..SpiritConfig::default()
        })
        .unwrap();
        let reply = gateway.consult("问", "", ConsultMode::Chat).await;
        assert_eq!(reply, FALLBACK_REPLY);
    }
}
