use crate::SandboxExecutor;
use crate::error::SandboxError;

use async_trait::async_trait;
use log::info;
use serde_json::Value;

/// In-process stand-in for a real sandbox, returning canned results for the demo catalog
#[derive(Clone, Debug, Default)]
pub struct SimulatedSandbox;

impl SimulatedSandbox {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SandboxExecutor for SimulatedSandbox {
    async fn execute(&self, tool_name: &str, params: &Value) -> Result<Value, SandboxError> {
        info!("SANDBOX: executing '{}' with params {}", tool_name, params);

        match tool_name {
            "read_files" => Ok(Value::String(
                "File content for 'read_files'".to_string(),
            )),
            "send_email" => Ok(Value::String(format!(
                "Email sent using params {}",
                params
            ))),
            other => Err(SandboxError::UnknownTool(other.to_string())),
        }
    }

    fn kind(&self) -> &'static str {
        "simulated"
    }
}
