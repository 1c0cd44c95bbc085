use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// 2-D canvas position. Carried for the editing surface, irrelevant to
/// execution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Free-form per-node configuration. The map itself is schema-less; readers
/// are capability-gated so the engine never pokes at raw keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeConfig(pub HashMap<String, Value>);

impl NodeConfig {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A shell task this node wants executed under the sandbox strategy
    /// after its agent generates.
    pub fn task(&self) -> Option<&str> {
        self.0.get("task").and_then(Value::as_str)
    }

    /// Per-node override of the sandbox task timeout.
    pub fn task_timeout_secs(&self) -> Option<u64> {
        self.0.get("taskTimeoutSecs").and_then(Value::as_u64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub config: NodeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub edge_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
    Error,
}

/// A directed graph of nodes and edges. Pure data: duplicate ids, dangling
/// edge endpoints and cycles are all representable here and are the
/// planner's problem to reject.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub status: WorkflowStatus,
}

impl Workflow {
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges leaving the given node.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a WorkflowEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Edges arriving at the given node.
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a WorkflowEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == id)
    }

    pub fn has_edges(&self) -> bool {
        !self.edges.is_empty()
    }
}
