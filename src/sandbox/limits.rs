use serde::{Deserialize, Serialize};

/// Resource-limit policy attached to a sandbox strategy instance.
/// Enforcement is platform-specific (cgroups, job objects); the policy is
/// queryable around every task run regardless.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceLimits {
    pub max_memory_mb: u64,
    pub max_cpu_percent: u8,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self { max_memory_mb: 512, max_cpu_percent: 50 }
    }
}

impl ResourceLimits {
    /// Whether the current process is within the declared limits.
    pub fn check_limits(&self) -> bool {
        // No portable enforcement primitive; the policy is advisory until a
        // platform backend lands.
        true
    }
}
