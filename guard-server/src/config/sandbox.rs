use confique::Config;
use serde::Deserialize;
use std::time::Duration;

/// Which executor runs admitted tool calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxMode {
    Simulated,
    Process,
}

/// Sandbox executor configuration
#[derive(Debug, Config, Clone)]
pub struct SandboxConfig {
    /// Executor kind, `simulated` or `process` (default: simulated)
    #[config(env = "GUARD_SANDBOX_MODE", default = "simulated")]
    pub mode: SandboxMode,

    /// Program spawned per tool call in process mode
    #[config(env = "GUARD_SANDBOX_PROGRAM")]
    pub program: Option<String>,

    /// Arguments placed before the tool name, comma-separated (default: "")
    #[config(env = "GUARD_SANDBOX_ARGS", default = "")]
    pub args: String,

    /// Per-call timeout in seconds (default: 10)
    #[config(env = "GUARD_SANDBOX_TIMEOUT", default = 10)]
    pub timeout: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            mode: SandboxMode::Simulated,
            program: None,
            args: String::new(),
            timeout: 10,
        }
    }
}

impl SandboxConfig {
    /// Get program arguments as a vector
    pub fn get_args(&self) -> Vec<String> {
        self.args
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
