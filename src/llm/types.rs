use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: &str) -> Self {
        Self { role: "system".to_string(), content: content.to_string() }
    }
    pub fn user(content: &str) -> Self {
        Self { role: "user".to_string(), content: content.to_string() }
    }
    pub fn assistant(content: &str) -> Self {
        Self { role: "assistant".to_string(), content: content.to_string() }
    }
}

/// A single generation request, already merged with any per-call overrides.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Messages array with the system message first when present.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::new();
        if let Some(sys) = &self.system {
            messages.push(Message::system(sys));
        }
        messages.push(Message::user(&self.prompt));
        messages
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    MissingApiKey,
    MissingBaseUrl,
    Network,
    Status(u16),
    MalformedResponse,
}

/// A provider failure the gateway deliberately does not raise. The display
/// string is what gets chained downstream in place of generated text.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderFault {
    pub provider: &'static str,
    pub kind: FaultKind,
    pub detail: String,
}

impl ProviderFault {
    pub fn missing_api_key(provider: &'static str) -> Self {
        Self { provider, kind: FaultKind::MissingApiKey, detail: String::new() }
    }

    pub fn missing_base_url(provider: &'static str) -> Self {
        Self { provider, kind: FaultKind::MissingBaseUrl, detail: String::new() }
    }

    pub fn network(provider: &'static str, detail: impl Into<String>) -> Self {
        Self { provider, kind: FaultKind::Network, detail: detail.into() }
    }

    pub fn status(provider: &'static str, code: u16) -> Self {
        Self { provider, kind: FaultKind::Status(code), detail: String::new() }
    }

    pub fn malformed(provider: &'static str, detail: impl Into<String>) -> Self {
        Self { provider, kind: FaultKind::MalformedResponse, detail: detail.into() }
    }
}

impl std::fmt::Display for ProviderFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            FaultKind::MissingApiKey => {
                write!(f, "Error: {} API key not configured", self.provider)
            }
            FaultKind::MissingBaseUrl => {
                write!(f, "Error: {} base URL not configured", self.provider)
            }
            FaultKind::Status(code) => {
                write!(f, "Error: {} returned status {}", self.provider, code)
            }
            FaultKind::Network | FaultKind::MalformedResponse => {
                write!(f, "Error communicating with {}: {}", self.provider, self.detail)
            }
        }
    }
}

impl std::error::Error for ProviderFault {}

/// The gateway's tagged result: either real model output or a typed fault.
/// Ordinary provider failures never surface as `Err`; downstream chaining
/// policy decides what to do with a fault.
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    Text(String),
    Fault(ProviderFault),
}

impl GenerationOutcome {
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Fault(_) => None,
        }
    }

    /// The string handed to the next step in the chain: generated text, or
    /// the fault rendered human-readable.
    pub fn into_chained_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Fault(fault) => fault.to_string(),
        }
    }
}
