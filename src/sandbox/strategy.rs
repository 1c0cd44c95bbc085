use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SandboxConfig;
use crate::errors::TroupeError;

use super::container::ContainerSandbox;
use super::limits::ResourceLimits;
use super::none::NoIsolation;
use super::process::ProcessSandbox;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SandboxKind {
    None,
    #[default]
    Process,
    Container,
}

impl SandboxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Process => "process",
            Self::Container => "container",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Error,
}

/// Uniform result envelope every strategy returns. Faults are folded into
/// `status = error`; nothing escapes the strategy boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub status: TaskStatus,
    pub output: String,
    pub agent_id: String,
    pub sandbox_type: SandboxKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl TaskResult {
    pub fn success(agent_id: &str, sandbox_type: SandboxKind, output: String) -> Self {
        Self {
            status: TaskStatus::Success,
            output,
            agent_id: agent_id.to_string(),
            sandbox_type,
            warning: None,
        }
    }

    pub fn error(agent_id: &str, sandbox_type: SandboxKind, output: String) -> Self {
        Self {
            status: TaskStatus::Error,
            output,
            agent_id: agent_id.to_string(),
            sandbox_type,
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// Key/value context handed to a task; strategies expose it to the task as
/// environment variables.
pub type TaskContext = HashMap<String, String>;

/// Run a task under one isolation level within a timeout and return the
/// uniform envelope. The engine never branches on the concrete strategy.
#[async_trait]
pub trait SandboxStrategy: Send + Sync + std::fmt::Debug {
    async fn execute(
        &self,
        agent_id: &str,
        task: &str,
        context: &TaskContext,
        timeout_secs: u64,
    ) -> TaskResult;

    fn kind(&self) -> SandboxKind;

    /// The resource-limit policy attached to this strategy instance.
    fn limits(&self) -> &ResourceLimits;
}

/// Build the strategy selected by configuration. Container isolation needs a
/// reachable Docker daemon, so construction can fail; the other two cannot.
pub fn create_strategy(config: &SandboxConfig) -> Result<Arc<dyn SandboxStrategy>, TroupeError> {
    let limits = config.limits.clone();
    match config.kind {
        SandboxKind::None => Ok(Arc::new(NoIsolation::new(limits))),
        SandboxKind::Process => Ok(Arc::new(ProcessSandbox::new(limits))),
        SandboxKind::Container => {
            let container = config.container_name.as_deref().ok_or_else(|| {
                TroupeError::Config("sandbox.containerName required for container isolation".into())
            })?;
            Ok(Arc::new(ContainerSandbox::new(container, limits)?))
        }
    }
}
