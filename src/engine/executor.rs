use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audit::ExecutionLogStore;
use crate::config::{EngineConfig, GatewayConfig};
use crate::errors::TroupeError;
use crate::llm::{GenerationOutcome, LLMGateway};
use crate::models::{Agent, LogLevel, Workflow};
use crate::sandbox::{create_strategy, SandboxStrategy, TaskContext, TaskStatus};

use super::planner::{ExecutionPlanner, PlanStep};

/// Result structure handed back to the collaborating layer. One of exactly
/// two shapes: a completed run with its aggregated outputs, or a terminal
/// error with no partial results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionReport {
    Completed {
        execution_id: String,
        results: HashMap<String, String>,
        #[serde(rename = "duration")]
        duration_secs: f64,
        final_output: String,
    },
    #[serde(rename = "error")]
    Failed { execution_id: String, error: String },
}

impl ExecutionReport {
    pub fn execution_id(&self) -> &str {
        match self {
            Self::Completed { execution_id, .. } | Self::Failed { execution_id, .. } => {
                execution_id
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// The coordinator: plans a workflow, drives the gateway per step with
/// output chaining, runs node-configured tasks under the sandbox strategy,
/// and owns the shared log store and active-execution registry.
///
/// One engine instance is constructed at process start and passed by
/// reference wherever executions are launched; concurrent `execute` calls
/// share nothing but the log store and registry.
pub struct WorkflowEngine {
    gateway: LLMGateway,
    gateway_config: GatewayConfig,
    sandbox: Arc<dyn SandboxStrategy>,
    task_timeout_secs: u64,
    registry: Arc<super::registry::ExecutionRegistry>,
    logs: Arc<ExecutionLogStore>,
}

impl WorkflowEngine {
    pub fn new(config: EngineConfig) -> Result<Self, TroupeError> {
        let sandbox = create_strategy(&config.sandbox)?;
        Ok(Self {
            gateway: LLMGateway::new(config.gateway.request_timeout_secs),
            gateway_config: config.gateway,
            sandbox,
            task_timeout_secs: config.sandbox.task_timeout_secs,
            registry: Arc::new(super::registry::ExecutionRegistry::new()),
            logs: Arc::new(ExecutionLogStore::new()),
        })
    }

    /// Swap the isolation backend, e.g. for a per-deployment strategy
    /// constructed outside the engine.
    pub fn with_sandbox(mut self, sandbox: Arc<dyn SandboxStrategy>) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn registry(&self) -> Arc<super::registry::ExecutionRegistry> {
        self.registry.clone()
    }

    pub fn logs(&self) -> Arc<ExecutionLogStore> {
        self.logs.clone()
    }

    /// Execute one workflow against a concrete agent set.
    ///
    /// Provider faults degrade the chain's content but never its control
    /// flow; only planning faults, cancellation, or an unexpected engine
    /// fault produce the error shape.
    pub async fn execute(
        &self,
        workflow: &Workflow,
        agents: &HashMap<String, Agent>,
        initial_input: &str,
        cancel: CancellationToken,
    ) -> ExecutionReport {
        let execution_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        self.registry.register(&execution_id, &workflow.id);
        info!(execution_id = %execution_id, workflow = %workflow.name, "Workflow execution started");
        self.logs
            .append(
                &workflow.id,
                None,
                LogLevel::Info,
                format!("Starting workflow execution: {}", workflow.name),
            )
            .await;

        match self.run_plan(workflow, agents, initial_input, &cancel).await {
            Ok((results, final_output)) => {
                let duration_secs = started.elapsed().as_secs_f64();
                self.registry.mark_completed(&execution_id);
                self.logs
                    .append(
                        &workflow.id,
                        None,
                        LogLevel::Info,
                        format!("Workflow completed in {:.2}s", duration_secs),
                    )
                    .await;
                info!(
                    execution_id = %execution_id,
                    steps = results.len(),
                    duration_secs,
                    "Workflow execution completed"
                );
                ExecutionReport::Completed { execution_id, results, duration_secs, final_output }
            }
            Err(e) => {
                self.registry.mark_failed(&execution_id);
                self.logs
                    .append(
                        &workflow.id,
                        None,
                        LogLevel::Error,
                        format!("Workflow execution failed: {}", e),
                    )
                    .await;
                error!(execution_id = %execution_id, error = %e, "Workflow execution failed");
                ExecutionReport::Failed { execution_id, error: e.to_string() }
            }
        }
    }

    async fn run_plan(
        &self,
        workflow: &Workflow,
        agents: &HashMap<String, Agent>,
        initial_input: &str,
        cancel: &CancellationToken,
    ) -> Result<(HashMap<String, String>, String), TroupeError> {
        // Fail fast: a malformed graph is rejected before any provider call.
        let plan = ExecutionPlanner::plan(workflow)?;

        let mut results = HashMap::new();
        let mut current_input = initial_input.to_string();

        for group in plan.groups() {
            self.check_cancelled(cancel)?;

            // Steps whose agent id is not in the supplied mapping are
            // skipped entirely: no log, no plan-order disruption.
            let runnable: Vec<(&PlanStep, &Agent)> = group
                .iter()
                .filter_map(|step| agents.get(&step.agent_id).map(|agent| (step, agent)))
                .collect();

            if runnable.is_empty() {
                continue;
            }

            if let [(step, agent)] = runnable[..] {
                let output = self.run_step(workflow, step, agent, &current_input, cancel).await?;
                results.insert(step.agent_id.clone(), output.clone());
                current_input = output;
            } else {
                // Parallel-eligible group: every step sees the same input;
                // outputs merge in node order before flowing on.
                let outputs = futures::future::join_all(
                    runnable
                        .iter()
                        .map(|&(step, agent)| {
                            self.run_step(workflow, step, agent, &current_input, cancel)
                        }),
                )
                .await;

                let mut merged = Vec::with_capacity(outputs.len());
                for (&(step, _), output) in runnable.iter().zip(outputs) {
                    let output = output?;
                    results.insert(step.agent_id.clone(), output.clone());
                    merged.push(output);
                }
                current_input = merged.join("\n\n");
            }
        }

        Ok((results, current_input))
    }

    async fn run_step(
        &self,
        workflow: &Workflow,
        step: &PlanStep,
        agent: &Agent,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TroupeError> {
        self.check_cancelled(cancel)?;

        let llm_config = self.gateway_config.config_for(agent);
        self.logs
            .append(
                &workflow.id,
                Some(step.agent_id.as_str()),
                LogLevel::Info,
                format!("Executing agent: {}", agent.name),
            )
            .await;

        let outcome = self
            .gateway
            .generate(&llm_config, input, Some(agent.system_prompt.as_str()), None, None)
            .await;

        if let GenerationOutcome::Fault(fault) = &outcome {
            warn!(agent = %agent.name, fault = %fault, "Provider fault, chaining fault text");
            let mut metadata = HashMap::new();
            metadata.insert("provider".to_string(), serde_json::json!(fault.provider));
            metadata.insert(
                "fault".to_string(),
                serde_json::to_value(&fault.kind).unwrap_or_default(),
            );
            self.logs
                .append_with_metadata(
                    &workflow.id,
                    Some(step.agent_id.as_str()),
                    LogLevel::Warning,
                    format!("Agent provider fault: {}", fault),
                    metadata,
                )
                .await;
        }

        // The chaining contract: whatever came back, fault text included,
        // becomes this step's result and the next step's input.
        let response = outcome.into_chained_text();
        self.logs
            .append(
                &workflow.id,
                Some(step.agent_id.as_str()),
                LogLevel::Info,
                format!("Agent completed: {} chars generated", response.len()),
            )
            .await;

        if let Some(node) = workflow.node(&step.node_id) {
            if let Some(task) = node.data.config.task() {
                self.run_node_task(workflow, step, node, task, &response).await;
            }
        }

        Ok(response)
    }

    /// Run a node-configured task under the sandbox strategy. The envelope
    /// is recorded in the log; it never alters the chained text.
    async fn run_node_task(
        &self,
        workflow: &Workflow,
        step: &PlanStep,
        node: &crate::models::WorkflowNode,
        task: &str,
        agent_output: &str,
    ) {
        let timeout_secs =
            node.data.config.task_timeout_secs().unwrap_or(self.task_timeout_secs);
        let mut context = TaskContext::new();
        context.insert("agent_output".to_string(), agent_output.to_string());

        let result = self.sandbox.execute(&step.agent_id, task, &context, timeout_secs).await;

        let level = match result.status {
            TaskStatus::Success => LogLevel::Info,
            TaskStatus::Error => LogLevel::Warning,
        };
        let mut metadata = HashMap::new();
        metadata.insert("sandbox".to_string(), serde_json::json!(result.sandbox_type));
        metadata.insert("taskStatus".to_string(), serde_json::json!(result.status));
        if let Some(warning) = &result.warning {
            metadata.insert("warning".to_string(), serde_json::json!(warning));
        }
        self.logs
            .append_with_metadata(
                &workflow.id,
                Some(step.agent_id.as_str()),
                level,
                format!("Sandboxed task finished: {}", result.output),
                metadata,
            )
            .await;
    }

    fn check_cancelled(&self, cancel: &CancellationToken) -> Result<(), TroupeError> {
        if cancel.is_cancelled() {
            Err(TroupeError::Cancelled("Workflow execution cancelled".into()))
        } else {
            Ok(())
        }
    }
}
