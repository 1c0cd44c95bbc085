pub mod container;
pub mod limits;
pub mod none;
pub mod process;
pub mod strategy;

pub use container::ContainerSandbox;
pub use limits::ResourceLimits;
pub use none::NoIsolation;
pub use process::ProcessSandbox;
pub use strategy::{
    create_strategy, SandboxKind, SandboxStrategy, TaskContext, TaskResult, TaskStatus,
};

/// Default per-task wall-clock timeout in seconds.
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 300;
