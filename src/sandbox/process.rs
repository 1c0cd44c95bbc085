use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::limits::ResourceLimits;
use super::strategy::{SandboxKind, SandboxStrategy, TaskContext, TaskResult};

/// Subprocess isolation with an enforced wall-clock timeout. The child is
/// spawned with `kill_on_drop`, so hitting the timeout kills it rather than
/// leaving it running past the deadline.
#[derive(Debug)]
pub struct ProcessSandbox {
    limits: ResourceLimits,
}

impl ProcessSandbox {
    pub fn new(limits: ResourceLimits) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl SandboxStrategy for ProcessSandbox {
    async fn execute(
        &self,
        agent_id: &str,
        task: &str,
        context: &TaskContext,
        timeout_secs: u64,
    ) -> TaskResult {
        debug!(agent_id, timeout_secs, task = %&task[..task.len().min(200)], "Spawning sandboxed task");

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(task)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in context {
            command.env(format!("TROUPE_{}", key.to_uppercase()), value);
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return TaskResult::error(agent_id, SandboxKind::Process, e.to_string()),
        };

        // Dropping the wait future on timeout drops the child handle, which
        // kills the process group member.
        let waited = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            child.wait_with_output(),
        )
        .await;

        match waited {
            Err(_) => TaskResult::error(agent_id, SandboxKind::Process, "Execution timeout".into()),
            Ok(Err(e)) => TaskResult::error(agent_id, SandboxKind::Process, e.to_string()),
            Ok(Ok(output)) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                if !output.stderr.is_empty() {
                    combined.push_str(&String::from_utf8_lossy(&output.stderr));
                }
                let combined = combined.trim_end().to_string();

                if output.status.success() {
                    TaskResult::success(agent_id, SandboxKind::Process, combined)
                } else {
                    let message = if combined.is_empty() {
                        format!("task exited with {}", output.status)
                    } else {
                        combined
                    };
                    TaskResult::error(agent_id, SandboxKind::Process, message)
                }
            }
        }
    }

    fn kind(&self) -> SandboxKind {
        SandboxKind::Process
    }

    fn limits(&self) -> &ResourceLimits {
        &self.limits
    }
}
