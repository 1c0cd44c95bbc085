use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::ChatProvider;
use super::types::{ChatRequest, ProviderFault};

const PROVIDER: &str = "Ollama";

/// Local-network chat endpoint speaking the Ollama wire shape.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new(client: Client, base_url: Option<&str>) -> Self {
        Self {
            client,
            base_url: base_url.unwrap_or("http://localhost:11434").to_string(),
        }
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderFault> {
        let body = json!({
            "model": request.model,
            "messages": request.messages(),
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            },
            "stream": false,
        });

        let resp = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderFault::network(PROVIDER, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderFault::status(PROVIDER, status.as_u16()));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| ProviderFault::malformed(PROVIDER, e.to_string()))?;

        // A 200 with no content field is an empty completion, not a fault.
        Ok(data["message"]["content"].as_str().unwrap_or("").to_string())
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
