use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{ExecutionLog, LogLevel};

/// Append-only audit store shared by all concurrent executions. Entries get
/// a server-assigned id and timestamp on append and are never mutated or
/// removed afterwards; retrieval order is append order.
#[derive(Debug, Default)]
pub struct ExecutionLogStore {
    entries: RwLock<Vec<ExecutionLog>>,
}

impl ExecutionLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(
        &self,
        workflow_id: &str,
        agent_id: Option<&str>,
        level: LogLevel,
        message: impl Into<String>,
    ) -> ExecutionLog {
        self.append_entry(workflow_id, agent_id, level, message.into(), None).await
    }

    pub async fn append_with_metadata(
        &self,
        workflow_id: &str,
        agent_id: Option<&str>,
        level: LogLevel,
        message: impl Into<String>,
        metadata: HashMap<String, Value>,
    ) -> ExecutionLog {
        self.append_entry(workflow_id, agent_id, level, message.into(), Some(metadata)).await
    }

    async fn append_entry(
        &self,
        workflow_id: &str,
        agent_id: Option<&str>,
        level: LogLevel,
        message: String,
        metadata: Option<HashMap<String, Value>>,
    ) -> ExecutionLog {
        let entry = ExecutionLog {
            id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.to_string(),
            agent_id: agent_id.map(str::to_string),
            timestamp: Utc::now(),
            level,
            message,
            metadata,
        };
        self.entries.write().await.push(entry.clone());
        entry
    }

    /// All entries, or only those for one workflow, in append order.
    pub async fn logs(&self, workflow_id: Option<&str>) -> Vec<ExecutionLog> {
        let entries = self.entries.read().await;
        match workflow_id {
            Some(id) => entries.iter().filter(|e| e.workflow_id == id).cloned().collect(),
            None => entries.clone(),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
