use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("No sandbox handler for tool '{0}'")]
    UnknownTool(String),

    #[error("Failed to spawn sandbox process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sandbox execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("Sandbox process exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("Failed to encode tool parameters: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Sandbox produced invalid output: {0}")]
    InvalidOutput(String),
}
