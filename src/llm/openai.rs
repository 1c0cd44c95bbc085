use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::ChatProvider;
use super::types::{ChatRequest, ProviderFault};

const PROVIDER: &str = "OpenAI";

pub struct OpenAiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(client: Client, api_key: Option<&str>, base_url: Option<&str>) -> Self {
        Self {
            client,
            api_key: api_key.map(str::to_string),
            base_url: base_url.unwrap_or("https://api.openai.com/v1").to_string(),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderFault> {
        // No key, no network call.
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderFault::missing_api_key(PROVIDER))?;

        let body = json!({
            "model": request.model,
            "messages": request.messages(),
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
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

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderFault::malformed(PROVIDER, "no content in response"))
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
