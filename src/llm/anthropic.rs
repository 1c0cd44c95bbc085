use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::ChatProvider;
use super::types::{ChatRequest, ProviderFault};

const PROVIDER: &str = "Anthropic";

pub struct AnthropicProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(client: Client, api_key: Option<&str>, base_url: Option<&str>) -> Self {
        Self {
            client,
            api_key: api_key.map(str::to_string),
            base_url: base_url.unwrap_or("https://api.anthropic.com").to_string(),
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderFault> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderFault::missing_api_key(PROVIDER))?;

        // Anthropic takes the system prompt as a top-level field, not a
        // message role.
        let body = json!({
            "model": request.model,
            "messages": [{"role": "user", "content": request.prompt}],
            "system": request.system.as_deref().unwrap_or(""),
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
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

        data["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderFault::malformed(PROVIDER, "no content in response"))
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
