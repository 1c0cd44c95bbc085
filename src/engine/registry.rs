use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionEntry {
    pub execution_id: String,
    pub workflow_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Live view over every execution the engine has seen. Entries transition
/// running → {completed, error} exactly once and are never deleted; bounding
/// retention is left to the embedding service.
#[derive(Debug, Default)]
pub struct ExecutionRegistry {
    entries: DashMap<String, ExecutionEntry>,
}

impl ExecutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, execution_id: &str, workflow_id: &str) -> ExecutionEntry {
        let entry = ExecutionEntry {
            execution_id: execution_id.to_string(),
            workflow_id: workflow_id.to_string(),
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
        };
        self.entries.insert(execution_id.to_string(), entry.clone());
        entry
    }

    pub fn mark_completed(&self, execution_id: &str) {
        self.terminate(execution_id, ExecutionStatus::Completed);
    }

    pub fn mark_failed(&self, execution_id: &str) {
        self.terminate(execution_id, ExecutionStatus::Error);
    }

    /// Terminal transitions apply only from `Running`; anything else is a
    /// no-op, which keeps transitions monotonic and re-queries idempotent.
    fn terminate(&self, execution_id: &str, status: ExecutionStatus) {
        if let Some(mut entry) = self.entries.get_mut(execution_id) {
            if entry.status == ExecutionStatus::Running {
                entry.status = status;
                entry.ended_at = Some(Utc::now());
            }
        }
    }

    pub fn get(&self, execution_id: &str) -> Option<ExecutionEntry> {
        self.entries.get(execution_id).map(|e| e.clone())
    }

    /// Only entries currently running.
    pub fn active(&self) -> HashMap<String, ExecutionEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == ExecutionStatus::Running)
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
