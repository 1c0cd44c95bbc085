mod common;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Json;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use troupe::config::{EngineConfig, GatewayConfig};
use troupe::engine::{ExecutionReport, ExecutionStatus, WorkflowEngine};
use troupe::models::{Agent, LogLevel, ProviderKind, Workflow};

use common::{agent, edge, node, ollama_reply, scripted_route, spawn_server, workflow, Capture};

fn engine_with_ollama(base_url: &str) -> WorkflowEngine {
    let config = EngineConfig {
        gateway: GatewayConfig {
            ollama_base_url: Some(base_url.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    WorkflowEngine::new(config).unwrap()
}

fn agents(list: Vec<Agent>) -> HashMap<String, Agent> {
    list.into_iter().map(|a| (a.id.clone(), a)).collect()
}

async fn run(
    engine: &WorkflowEngine,
    wf: &Workflow,
    agents: &HashMap<String, Agent>,
    input: &str,
) -> ExecutionReport {
    engine.execute(wf, agents, input, CancellationToken::new()).await
}

#[tokio::test]
async fn unreachable_provider_still_completes() {
    // Port 1 refuses connections; the provider fault must degrade content,
    // not control flow.
    let engine = engine_with_ollama("http://127.0.0.1:1");
    let wf = workflow("wf1", vec![node("n1", Some("a1"))], vec![]);
    let team = agents(vec![agent("a1", ProviderKind::Ollama, "llama2")]);

    let report = run(&engine, &wf, &team, "hello").await;

    match &report {
        ExecutionReport::Completed { results, final_output, .. } => {
            let text = &results["a1"];
            assert!(text.starts_with("Error communicating with Ollama:"), "got: {}", text);
            assert_eq!(final_output, text);
        }
        ExecutionReport::Failed { error, .. } => panic!("expected completion, got: {}", error),
    }

    let entry = engine.registry().get(report.execution_id()).unwrap();
    assert_eq!(entry.status, ExecutionStatus::Completed);
    assert!(engine.registry().active().is_empty());
}

#[tokio::test]
async fn chained_output_is_next_prompt_verbatim() {
    let capture = Capture::default();
    let router = scripted_route(
        "/api/chat",
        vec![ollama_reply("X"), ollama_reply("Y")],
        capture.clone(),
    );
    let base = spawn_server(router).await;

    let engine = engine_with_ollama(&base);
    let wf = workflow(
        "wf1",
        vec![node("n1", Some("a1")), node("n2", Some("a2"))],
        vec![],
    );
    let team = agents(vec![
        agent("a1", ProviderKind::Ollama, "m1"),
        agent("a2", ProviderKind::Ollama, "m2"),
    ]);

    let report = run(&engine, &wf, &team, "start").await;

    match report {
        ExecutionReport::Completed { results, final_output, .. } => {
            assert_eq!(results["a1"], "X");
            assert_eq!(results["a2"], "Y");
            assert_eq!(final_output, "Y");
        }
        ExecutionReport::Failed { error, .. } => panic!("expected completion, got: {}", error),
    }

    let requests = capture.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["body"]["messages"][0]["content"], "start");
    // a1's raw output is delivered to a2 exactly.
    assert_eq!(requests[1]["body"]["messages"][0]["content"], "X");
}

#[tokio::test]
async fn logs_record_the_run_in_order() {
    let router = scripted_route("/api/chat", vec![ollama_reply("out")], Capture::default());
    let base = spawn_server(router).await;

    let engine = engine_with_ollama(&base);
    let wf = workflow("wf-logs", vec![node("n1", Some("a1"))], vec![]);
    let team = agents(vec![agent("a1", ProviderKind::Ollama, "m1")]);

    run(&engine, &wf, &team, "go").await;

    let logs = engine.logs().logs(Some("wf-logs")).await;
    let messages: Vec<&str> = logs.iter().map(|l| l.message.as_str()).collect();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0], "Starting workflow execution: Workflow wf-logs");
    assert_eq!(messages[1], "Executing agent: Agent a1");
    assert_eq!(messages[2], "Agent completed: 3 chars generated");
    assert!(messages[3].starts_with("Workflow completed in "));

    assert_eq!(logs[1].agent_id.as_deref(), Some("a1"));
    assert!(engine.logs().logs(Some("other-wf")).await.is_empty());
}

#[tokio::test]
async fn unknown_agent_ids_are_skipped_silently() {
    let router = scripted_route(
        "/api/chat",
        vec![ollama_reply("first"), ollama_reply("second")],
        Capture::default(),
    );
    let base = spawn_server(router).await;

    let engine = engine_with_ollama(&base);
    let wf = workflow(
        "wf1",
        vec![
            node("n1", Some("a1")),
            node("n2", Some("ghost")),
            node("n3", Some("a3")),
        ],
        vec![],
    );
    let team = agents(vec![
        agent("a1", ProviderKind::Ollama, "m1"),
        agent("a3", ProviderKind::Ollama, "m3"),
    ]);

    let report = run(&engine, &wf, &team, "go").await;

    match report {
        ExecutionReport::Completed { results, final_output, .. } => {
            assert_eq!(results.len(), 2);
            assert!(!results.contains_key("ghost"));
            assert_eq!(final_output, "second");
        }
        ExecutionReport::Failed { error, .. } => panic!("expected completion, got: {}", error),
    }

    // Silent skip: the ghost step leaves no trace in the log.
    let logs = engine.logs().logs(Some("wf1")).await;
    assert!(logs.iter().all(|l| l.agent_id.as_deref() != Some("ghost")));
    assert!(logs.iter().all(|l| !l.message.contains("ghost")));
}

#[tokio::test]
async fn cycle_fails_fast_before_any_provider_call() {
    let capture = Capture::default();
    let router = scripted_route("/api/chat", vec![ollama_reply("never")], capture.clone());
    let base = spawn_server(router).await;

    let engine = engine_with_ollama(&base);
    let wf = workflow(
        "wf-cycle",
        vec![node("n1", Some("a1")), node("n2", Some("a2"))],
        vec![edge("e1", "n1", "n2"), edge("e2", "n2", "n1")],
    );
    let team = agents(vec![
        agent("a1", ProviderKind::Ollama, "m1"),
        agent("a2", ProviderKind::Ollama, "m2"),
    ]);

    let report = run(&engine, &wf, &team, "go").await;

    match &report {
        ExecutionReport::Failed { error, .. } => assert!(error.contains("cycle"), "got: {}", error),
        ExecutionReport::Completed { .. } => panic!("expected planning failure"),
    }
    assert_eq!(capture.len(), 0);

    let entry = engine.registry().get(report.execution_id()).unwrap();
    assert_eq!(entry.status, ExecutionStatus::Error);
    assert!(entry.ended_at.is_some());

    let logs = engine.logs().logs(Some("wf-cycle")).await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[1].level, LogLevel::Error);
}

#[tokio::test]
async fn terminal_snapshot_is_idempotent() {
    let router = scripted_route("/api/chat", vec![ollama_reply("done")], Capture::default());
    let base = spawn_server(router).await;

    let engine = engine_with_ollama(&base);
    let wf = workflow("wf1", vec![node("n1", Some("a1"))], vec![]);
    let team = agents(vec![agent("a1", ProviderKind::Ollama, "m1")]);

    let report = run(&engine, &wf, &team, "go").await;
    let id = report.execution_id();

    let first = engine.registry().get(id).unwrap();
    let second = engine.registry().get(id).unwrap();
    assert_eq!(first.status, ExecutionStatus::Completed);
    assert_eq!(second.status, first.status);
    assert_eq!(second.ended_at, first.ended_at);
    assert_eq!(second.started_at, first.started_at);
}

#[tokio::test]
async fn parallel_group_merges_outputs_in_node_order() {
    // Diamond: a1 fans out to a2/a3, which join into a4. The mock replies
    // keyed by model name so the parallel arrival order cannot matter.
    let capture = Capture::default();
    let replies = Arc::new(
        [
            ("m1", "alpha"),
            ("m2", "beta"),
            ("m3", "gamma"),
            ("m4", "done"),
        ]
        .into_iter()
        .collect::<HashMap<_, _>>(),
    );
    let router = {
        let capture = capture.clone();
        axum::Router::new().route(
            "/api/chat",
            axum::routing::post(move |Json(body): Json<serde_json::Value>| {
                let capture = capture.clone();
                let replies = replies.clone();
                async move {
                    capture.push_body(body.clone());
                    let model = body["model"].as_str().unwrap_or("");
                    let content = replies.get(model).copied().unwrap_or("?");
                    Json(ollama_reply(content))
                }
            }),
        )
    };
    let base = spawn_server(router).await;

    let engine = engine_with_ollama(&base);
    let wf = workflow(
        "wf-diamond",
        vec![
            node("n1", Some("a1")),
            node("n2", Some("a2")),
            node("n3", Some("a3")),
            node("n4", Some("a4")),
        ],
        vec![
            edge("e1", "n1", "n2"),
            edge("e2", "n1", "n3"),
            edge("e3", "n2", "n4"),
            edge("e4", "n3", "n4"),
        ],
    );
    let team = agents(vec![
        agent("a1", ProviderKind::Ollama, "m1"),
        agent("a2", ProviderKind::Ollama, "m2"),
        agent("a3", ProviderKind::Ollama, "m3"),
        agent("a4", ProviderKind::Ollama, "m4"),
    ]);

    let report = run(&engine, &wf, &team, "go").await;

    match report {
        ExecutionReport::Completed { results, final_output, .. } => {
            assert_eq!(results.len(), 4);
            assert_eq!(final_output, "done");
        }
        ExecutionReport::Failed { error, .. } => panic!("expected completion, got: {}", error),
    }

    // The join step received both branch outputs, merged in node order.
    let requests = capture.requests();
    let join_prompt = requests
        .iter()
        .find(|r| r["body"]["model"] == "m4")
        .map(|r| r["body"]["messages"][0]["content"].clone())
        .unwrap();
    assert_eq!(join_prompt, "beta\n\ngamma");
}

#[tokio::test]
async fn concurrent_executions_do_not_interfere() {
    let router = scripted_route("/api/chat", vec![ollama_reply("out")], Capture::default());
    let base = spawn_server(router).await;

    let engine = Arc::new(engine_with_ollama(&base));
    let wf_a = workflow("wf-a", vec![node("n1", Some("a1"))], vec![]);
    let wf_b = workflow("wf-b", vec![node("n1", Some("a1"))], vec![]);
    let team = agents(vec![agent("a1", ProviderKind::Ollama, "m1")]);

    let task_a = {
        let engine = engine.clone();
        let wf = wf_a.clone();
        let team = team.clone();
        tokio::spawn(async move { run(&engine, &wf, &team, "go").await })
    };
    let task_b = {
        let engine = engine.clone();
        let wf = wf_b.clone();
        let team = team.clone();
        tokio::spawn(async move { run(&engine, &wf, &team, "go").await })
    };

    let (report_a, report_b) = (task_a.await.unwrap(), task_b.await.unwrap());
    assert!(report_a.is_completed());
    assert!(report_b.is_completed());
    assert_ne!(report_a.execution_id(), report_b.execution_id());

    assert_eq!(engine.registry().len(), 2);
    assert!(engine.registry().active().is_empty());
    assert_eq!(engine.logs().logs(Some("wf-a")).await.len(), 4);
    assert_eq!(engine.logs().logs(Some("wf-b")).await.len(), 4);
}

#[tokio::test]
async fn cancelled_token_aborts_with_error_report() {
    let engine = engine_with_ollama("http://127.0.0.1:1");
    let wf = workflow("wf1", vec![node("n1", Some("a1"))], vec![]);
    let team = agents(vec![agent("a1", ProviderKind::Ollama, "m1")]);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = engine.execute(&wf, &team, "go", cancel).await;

    match &report {
        ExecutionReport::Failed { error, .. } => {
            assert!(error.contains("cancelled"), "got: {}", error)
        }
        ExecutionReport::Completed { .. } => panic!("expected cancellation"),
    }
    let entry = engine.registry().get(report.execution_id()).unwrap();
    assert_eq!(entry.status, ExecutionStatus::Error);
}

#[tokio::test]
async fn node_task_runs_under_sandbox_and_is_logged() {
    let router = scripted_route("/api/chat", vec![ollama_reply("payload")], Capture::default());
    let base = spawn_server(router).await;

    let engine = engine_with_ollama(&base);
    let mut task_node = node("n1", Some("a1"));
    task_node.data.config = serde_json::from_value(json!({
        "task": "printf \"$TROUPE_AGENT_OUTPUT\"",
        "taskTimeoutSecs": 10
    }))
    .unwrap();
    let wf = workflow("wf-task", vec![task_node], vec![]);
    let team = agents(vec![agent("a1", ProviderKind::Ollama, "m1")]);

    let report = run(&engine, &wf, &team, "go").await;
    match &report {
        ExecutionReport::Completed { final_output, .. } => {
            // Sandbox output never alters the chained text.
            assert_eq!(final_output, "payload");
        }
        ExecutionReport::Failed { error, .. } => panic!("expected completion, got: {}", error),
    }

    let logs = engine.logs().logs(Some("wf-task")).await;
    let task_log = logs
        .iter()
        .find(|l| l.message.starts_with("Sandboxed task finished:"))
        .expect("missing sandbox log entry");
    assert_eq!(task_log.message, "Sandboxed task finished: payload");
    let metadata = task_log.metadata.as_ref().unwrap();
    assert_eq!(metadata["sandbox"], "process");
    assert_eq!(metadata["taskStatus"], "success");
}

#[tokio::test]
async fn provider_fault_is_logged_with_metadata() {
    let engine = engine_with_ollama("http://127.0.0.1:1");
    let wf = workflow("wf-fault", vec![node("n1", Some("a1"))], vec![]);
    let team = agents(vec![agent("a1", ProviderKind::Ollama, "m1")]);

    run(&engine, &wf, &team, "go").await;

    let logs = engine.logs().logs(Some("wf-fault")).await;
    let fault_log = logs
        .iter()
        .find(|l| l.level == LogLevel::Warning)
        .expect("missing fault warning");
    assert!(fault_log.message.starts_with("Agent provider fault:"));
    assert_eq!(fault_log.metadata.as_ref().unwrap()["provider"], "Ollama");
}
