use async_trait::async_trait;
use tracing::warn;

use super::limits::ResourceLimits;
use super::strategy::{SandboxKind, SandboxStrategy, TaskContext, TaskResult};

/// Inline execution with no isolation. Always reports success and tags the
/// result with a warning; meant for trusted development contexts only.
#[derive(Debug)]
pub struct NoIsolation {
    limits: ResourceLimits,
}

impl NoIsolation {
    pub fn new(limits: ResourceLimits) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl SandboxStrategy for NoIsolation {
    async fn execute(
        &self,
        agent_id: &str,
        task: &str,
        _context: &TaskContext,
        _timeout_secs: u64,
    ) -> TaskResult {
        warn!(agent_id, "Running task without isolation");
        TaskResult::success(
            agent_id,
            SandboxKind::None,
            format!("Direct execution of task for agent {}: {}", agent_id, task),
        )
        .with_warning("No sandboxing applied")
    }

    fn kind(&self) -> SandboxKind {
        SandboxKind::None
    }

    fn limits(&self) -> &ResourceLimits {
        &self.limits
    }
}
