use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::models::{LLMConfig, ProviderKind};

use super::anthropic::AnthropicProvider;
use super::custom::CustomProvider;
use super::ollama::OllamaProvider;
use super::openai::OpenAiProvider;
use super::provider::ChatProvider;
use super::types::{ChatRequest, GenerationOutcome, ProviderFault};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Uniform generation capability over the provider backends.
///
/// `generate` never returns an error for ordinary provider failures: a
/// missing credential, an unreachable endpoint or a non-success status all
/// come back as [`GenerationOutcome::Fault`] so a single agent's outage
/// degrades the chain's content, not its control flow.
#[derive(Debug, Clone)]
pub struct LLMGateway {
    request_timeout: Duration,
}

impl Default for LLMGateway {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT_SECS)
    }
}

impl LLMGateway {
    pub fn new(request_timeout_secs: u64) -> Self {
        Self { request_timeout: Duration::from_secs(request_timeout_secs) }
    }

    pub async fn generate(
        &self,
        config: &LLMConfig,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> GenerationOutcome {
        let request = ChatRequest {
            model: config.model_name.clone(),
            system: system_prompt.filter(|s| !s.is_empty()).map(str::to_string),
            prompt: prompt.to_string(),
            temperature: temperature.unwrap_or(config.temperature),
            max_tokens: max_tokens.unwrap_or(config.max_tokens),
        };

        // One client per invocation scope with a fixed request timeout. It is
        // dropped when this scope exits, success or fault.
        let client = match Client::builder().timeout(self.request_timeout).build() {
            Ok(client) => client,
            Err(e) => {
                return GenerationOutcome::Fault(ProviderFault::network(
                    "HTTP client",
                    e.to_string(),
                ))
            }
        };

        let provider: Box<dyn ChatProvider> = match config.provider {
            ProviderKind::Ollama => {
                Box::new(OllamaProvider::new(client, config.base_url.as_deref()))
            }
            ProviderKind::OpenAi => Box::new(OpenAiProvider::new(
                client,
                config.api_key.as_deref(),
                config.base_url.as_deref(),
            )),
            ProviderKind::Anthropic => Box::new(AnthropicProvider::new(
                client,
                config.api_key.as_deref(),
                config.base_url.as_deref(),
            )),
            ProviderKind::Custom => Box::new(CustomProvider::new(
                client,
                config.api_key.as_deref(),
                config.base_url.as_deref(),
            )),
        };

        debug!(
            provider = %config.provider,
            model = %request.model,
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            "Dispatching generation request"
        );

        match provider.complete(&request).await {
            Ok(text) => {
                debug!(provider = provider.name(), chars = text.len(), "Generation succeeded");
                GenerationOutcome::Text(text)
            }
            Err(fault) => {
                debug!(provider = provider.name(), fault = %fault, "Generation fault");
                GenerationOutcome::Fault(fault)
            }
        }
    }
}
