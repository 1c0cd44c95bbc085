pub mod agent;
pub mod log;
pub mod workflow;

pub use agent::{Agent, AgentStatus, LLMConfig, ProviderKind};
pub use log::{ExecutionLog, LogLevel};
pub use workflow::{
    NodeConfig, NodeData, Position, Workflow, WorkflowEdge, WorkflowNode, WorkflowStatus,
};
