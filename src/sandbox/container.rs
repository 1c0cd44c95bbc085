use std::time::Duration;

use async_trait::async_trait;
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::Docker;
use futures::StreamExt;
use tracing::debug;

use crate::errors::TroupeError;

use super::limits::ResourceLimits;
use super::strategy::{SandboxKind, SandboxStrategy, TaskContext, TaskResult};

/// Container isolation: the task runs as a Docker exec inside a long-lived
/// container, with the same envelope and timeout semantics as the process
/// strategy.
#[derive(Debug)]
pub struct ContainerSandbox {
    docker: Docker,
    container_name: String,
    limits: ResourceLimits,
}

impl ContainerSandbox {
    pub fn new(container_name: &str, limits: ResourceLimits) -> Result<Self, TroupeError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| TroupeError::Container(format!("Failed to connect to Docker: {}", e)))?;
        Ok(Self { docker, container_name: container_name.to_string(), limits })
    }

    async fn run_exec(
        &self,
        task: &str,
        context: &TaskContext,
    ) -> Result<String, bollard::errors::Error> {
        let env: Vec<String> = context
            .iter()
            .map(|(key, value)| format!("TROUPE_{}={}", key.to_uppercase(), value))
            .collect();

        let exec = self
            .docker
            .create_exec(
                &self.container_name,
                CreateExecOptions {
                    cmd: Some(vec!["sh".to_string(), "-c".to_string(), task.to_string()]),
                    env: Some(env),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        let start = self.docker.start_exec(&exec.id, None).await?;

        let mut collected = String::new();
        if let StartExecResults::Attached { mut output, .. } = start {
            while let Some(msg) = output.next().await {
                match msg {
                    Ok(chunk) => collected.push_str(&chunk.to_string()),
                    Err(e) => {
                        collected.push_str(&format!("\n[exec error: {}]", e));
                        break;
                    }
                }
            }
        }
        Ok(collected)
    }
}

#[async_trait]
impl SandboxStrategy for ContainerSandbox {
    async fn execute(
        &self,
        agent_id: &str,
        task: &str,
        context: &TaskContext,
        timeout_secs: u64,
    ) -> TaskResult {
        debug!(
            agent_id,
            container = %self.container_name,
            timeout_secs,
            "Executing task in container"
        );

        let run = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.run_exec(task, context),
        )
        .await;

        match run {
            Err(_) => TaskResult::error(agent_id, SandboxKind::Container, "Execution timeout".into()),
            Ok(Err(e)) => TaskResult::error(agent_id, SandboxKind::Container, e.to_string()),
            Ok(Ok(output)) => {
                TaskResult::success(agent_id, SandboxKind::Container, output.trim_end().to_string())
            }
        }
    }

    fn kind(&self) -> SandboxKind {
        SandboxKind::Container
    }

    fn limits(&self) -> &ResourceLimits {
        &self.limits
    }
}
