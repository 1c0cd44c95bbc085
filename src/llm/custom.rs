use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::ChatProvider;
use super::types::{ChatRequest, ProviderFault};

const PROVIDER: &str = "custom API";

/// Generic OpenAI-compatible endpoint at a user-supplied base URL. The API
/// key is optional; a bearer header is attached only when one is present.
pub struct CustomProvider {
    client: Client,
    api_key: Option<String>,
    base_url: Option<String>,
}

impl CustomProvider {
    pub fn new(client: Client, api_key: Option<&str>, base_url: Option<&str>) -> Self {
        Self {
            client,
            api_key: api_key.map(str::to_string),
            base_url: base_url.map(str::to_string),
        }
    }
}

#[async_trait]
impl ChatProvider for CustomProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderFault> {
        let base_url = self
            .base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ProviderFault::missing_base_url(PROVIDER))?;

        let body = json!({
            "model": request.model,
            "messages": request.messages(),
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let mut req = self.client.post(format!("{}/chat/completions", base_url));
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req
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
