use serde::{Deserialize, Serialize};

use crate::models::{Agent, LLMConfig, ProviderKind};
use crate::sandbox::{ResourceLimits, SandboxKind, DEFAULT_TASK_TIMEOUT_SECS};

use super::credentials::resolve_credential;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub gateway: GatewayConfig,
    pub sandbox: SandboxConfig,
}

/// Provider credentials and endpoints. Values may reference environment
/// variables with a `$NAME` prefix; they are resolved when the per-agent
/// `LLMConfig` is derived, not at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    pub request_timeout_secs: u64,
    pub ollama_base_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub custom_base_url: Option<String>,
    pub custom_api_key: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: crate::llm::DEFAULT_REQUEST_TIMEOUT_SECS,
            ollama_base_url: None,
            openai_api_key: None,
            anthropic_api_key: None,
            custom_base_url: None,
            custom_api_key: None,
        }
    }
}

impl GatewayConfig {
    /// Derive the transient per-invocation provider configuration for one
    /// agent: the agent supplies generation parameters, the gateway config
    /// supplies credentials and endpoints.
    pub fn config_for(&self, agent: &Agent) -> LLMConfig {
        let (api_key, base_url) = match agent.llm_provider {
            ProviderKind::Ollama => (None, self.ollama_base_url.clone()),
            ProviderKind::OpenAi => (self.openai_api_key.as_deref().map(resolve_credential), None),
            ProviderKind::Anthropic => {
                (self.anthropic_api_key.as_deref().map(resolve_credential), None)
            }
            ProviderKind::Custom => (
                self.custom_api_key.as_deref().map(resolve_credential),
                self.custom_base_url.clone(),
            ),
        };

        LLMConfig {
            provider: agent.llm_provider,
            api_key,
            base_url,
            model_name: agent.model_name.clone(),
            temperature: agent.temperature,
            max_tokens: agent.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SandboxConfig {
    pub kind: SandboxKind,
    pub task_timeout_secs: u64,
    /// Target container for the container strategy.
    pub container_name: Option<String>,
    pub limits: ResourceLimits,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            kind: SandboxKind::Process,
            task_timeout_secs: DEFAULT_TASK_TIMEOUT_SECS,
            container_name: None,
            limits: ResourceLimits::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgentStatus;

    fn agent(provider: ProviderKind) -> Agent {
        Agent {
            id: "a1".into(),
            name: "Writer".into(),
            role: "writer".into(),
            description: String::new(),
            llm_provider: provider,
            model_name: "m".into(),
            system_prompt: "sys".into(),
            temperature: 0.3,
            max_tokens: 512,
            status: AgentStatus::Idle,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_config_for_carries_agent_params() {
        let gateway = GatewayConfig::default();
        let config = gateway.config_for(&agent(ProviderKind::Ollama));
        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.max_tokens, 512);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_config_for_routes_credentials_per_provider() {
        let gateway = GatewayConfig {
            openai_api_key: Some("sk-test".into()),
            anthropic_api_key: Some("ak-test".into()),
            custom_base_url: Some("http://localhost:9000/v1".into()),
            ..Default::default()
        };

        let openai = gateway.config_for(&agent(ProviderKind::OpenAi));
        assert_eq!(openai.api_key.as_deref(), Some("sk-test"));
        assert!(openai.base_url.is_none());

        let custom = gateway.config_for(&agent(ProviderKind::Custom));
        assert!(custom.api_key.is_none());
        assert_eq!(custom.base_url.as_deref(), Some("http://localhost:9000/v1"));
    }

    #[test]
    fn test_sandbox_defaults() {
        let sandbox = SandboxConfig::default();
        assert_eq!(sandbox.kind, SandboxKind::Process);
        assert_eq!(sandbox.task_timeout_secs, 300);
    }
}
