use thiserror::Error;

#[derive(Debug, Error)]
pub enum TroupeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Planning error: {0}")]
    Plan(String),

    #[error("Workflow graph contains a cycle: {0}")]
    GraphCycle(String),

    #[error("Sandbox error: {0}")]
    Sandbox(String),

    #[error("Container error: {0}")]
    Container(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Execution cancelled: {0}")]
    Cancelled(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TroupeError {
    /// True for faults that indicate a malformed workflow graph rather than
    /// a runtime failure. Callers report these as configuration problems.
    pub fn is_planning(&self) -> bool {
        matches!(self, TroupeError::Plan(_) | TroupeError::GraphCycle(_))
    }
}
