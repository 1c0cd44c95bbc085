#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::extract::Json;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use troupe::models::{
    Agent, AgentStatus, NodeConfig, NodeData, Position, ProviderKind, Workflow, WorkflowEdge,
    WorkflowNode, WorkflowStatus,
};

/// Bind a mock provider endpoint on an ephemeral port and serve it in the
/// background. Returns the base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Requests seen by a mock endpoint, in arrival order. Each entry is
/// `{"headers": {...}, "body": {...}}`.
#[derive(Clone, Default)]
pub struct Capture {
    requests: Arc<Mutex<Vec<Value>>>,
}

impl Capture {
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Record a body-only request (for handlers that don't care about
    /// headers).
    pub fn push_body(&self, body: Value) {
        self.requests
            .lock()
            .unwrap()
            .push(json!({"headers": {}, "body": body}));
    }

    fn record(&self, headers: &HeaderMap, body: &Value) {
        let headers: serde_json::Map<String, Value> = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    Value::String(value.to_str().unwrap_or("").to_string()),
                )
            })
            .collect();
        self.requests
            .lock()
            .unwrap()
            .push(json!({"headers": headers, "body": body}));
    }
}

/// A POST route that records every request and pops canned replies in
/// order; once the queue is dry it keeps repeating the last reply.
pub fn scripted_route(path: &str, replies: Vec<Value>, capture: Capture) -> Router {
    let last = replies.last().cloned().unwrap_or_else(|| json!({}));
    let queue = Arc::new(Mutex::new(VecDeque::from(replies)));
    Router::new().route(
        path,
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let capture = capture.clone();
            let queue = queue.clone();
            let last = last.clone();
            async move {
                capture.record(&headers, &body);
                let reply = queue.lock().unwrap().pop_front().unwrap_or(last);
                Json(reply)
            }
        }),
    )
}

pub fn ollama_reply(content: &str) -> Value {
    json!({"message": {"role": "assistant", "content": content}, "done": true})
}

pub fn openai_reply(content: &str) -> Value {
    json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
}

pub fn anthropic_reply(content: &str) -> Value {
    json!({"content": [{"type": "text", "text": content}]})
}

pub fn agent(id: &str, provider: ProviderKind, model: &str) -> Agent {
    Agent {
        id: id.to_string(),
        name: format!("Agent {}", id),
        role: "worker".to_string(),
        description: String::new(),
        llm_provider: provider,
        model_name: model.to_string(),
        system_prompt: String::new(),
        temperature: 0.7,
        max_tokens: 2000,
        status: AgentStatus::Idle,
        created_at: None,
        updated_at: None,
    }
}

pub fn node(id: &str, agent_id: Option<&str>) -> WorkflowNode {
    WorkflowNode {
        id: id.to_string(),
        node_type: "agent".to_string(),
        position: Position::default(),
        data: NodeData {
            label: id.to_string(),
            agent_id: agent_id.map(str::to_string),
            config: NodeConfig::default(),
        },
    }
}

pub fn edge(id: &str, source: &str, target: &str) -> WorkflowEdge {
    WorkflowEdge {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        label: None,
        edge_type: None,
    }
}

pub fn workflow(id: &str, nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> Workflow {
    Workflow {
        id: id.to_string(),
        name: format!("Workflow {}", id),
        description: String::new(),
        nodes,
        edges,
        status: WorkflowStatus::Draft,
    }
}
