use std::collections::HashMap;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{parse_config, EngineConfig};
use crate::engine::WorkflowEngine;
use crate::errors::TroupeError;
use crate::models::{Agent, Workflow};
use crate::sandbox::SandboxKind;

use super::RunArgs;

pub async fn handle_run(args: RunArgs) -> Result<(), TroupeError> {
    let mut config = match &args.config {
        Some(path) => parse_config(path).await?,
        None => EngineConfig::default(),
    };
    if let Some(sandbox) = &args.sandbox {
        config.sandbox.kind = parse_sandbox_kind(sandbox)?;
    }

    let workflow: Workflow = load_yaml(&args.workflow).await?;
    let agents: Vec<Agent> = load_yaml(&args.agents).await?;
    let agents: HashMap<String, Agent> =
        agents.into_iter().map(|agent| (agent.id.clone(), agent)).collect();

    info!(
        workflow = %workflow.name,
        agents = agents.len(),
        sandbox = config.sandbox.kind.as_str(),
        "Starting run"
    );

    let engine = WorkflowEngine::new(config)?;

    // Ctrl-C cancels the in-flight execution instead of killing the process
    // mid-write.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let report = engine.execute(&workflow, &agents, &args.input, cancel).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.show_logs {
        let logs = engine.logs().logs(Some(&workflow.id)).await;
        println!("{}", serde_json::to_string_pretty(&logs)?);
    }

    Ok(())
}

fn parse_sandbox_kind(value: &str) -> Result<SandboxKind, TroupeError> {
    match value {
        "none" => Ok(SandboxKind::None),
        "process" => Ok(SandboxKind::Process),
        "container" => Ok(SandboxKind::Container),
        other => Err(TroupeError::Config(format!("Unknown sandbox strategy: {}", other))),
    }
}

pub(super) async fn load_yaml<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<T, TroupeError> {
    if !path.exists() {
        return Err(TroupeError::Config(format!("File not found: {}", path.display())));
    }
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_yaml::from_str(&content)?)
}
