use crate::authz::Principal;
use crate::tools::registry::{ToolDefinition, ToolRegistry};

use guard_sandbox::SandboxExecutor;
use log::{debug, error, info};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

/// Asks the client to obtain explicit human confirmation before a destructive tool runs
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Elicitation {
    #[serde(rename = "type")]
    pub kind: String,
    pub tool: String,
    pub message: String,
    /// JSON Schema the confirmation response must satisfy
    #[schema(value_type = Object)]
    pub schema: Value,
}

impl Elicitation {
    fn confirm(tool: &ToolDefinition) -> Self {
        Self {
            kind: "confirmation".to_string(),
            tool: tool.name.clone(),
            message: format!(
                "'{}' is destructive and requires explicit confirmation. Do you really want to run it?",
                tool.name
            ),
            schema: json!({
                "type": "object",
                "properties": {
                    "confirmation": {"type": "boolean", "const": true},
                    "reason": {"type": "string", "minLength": 1}
                },
                "required": ["confirmation", "reason"]
            }),
        }
    }
}

/// Terminal state of one tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Success(Value),
    PendingConfirmation(Elicitation),
    ScopeDenied { tool: String, missing_scope: String },
    ToolNotFound { name: String },
    SandboxError { message: String },
}

/// Drives a tool call through lookup, scope check, confirmation and sandboxed execution
#[derive(Clone)]
pub struct ExecutionController {
    registry: Arc<ToolRegistry>,
    sandbox: Arc<dyn SandboxExecutor>,
}

impl ExecutionController {
    pub fn new(registry: Arc<ToolRegistry>, sandbox: Arc<dyn SandboxExecutor>) -> Self {
        Self { registry, sandbox }
    }

    /// Runs `tool_name` for an already admitted `principal`.
    ///
    /// Only the tool name and parameters reach the sandbox; the caller's credential is not
    /// part of this signature and cannot be forwarded.
    pub async fn invoke(
        &self,
        principal: &Principal,
        tool_name: Option<&str>,
        params: &Value,
    ) -> ExecutionOutcome {
        let Some(tool) = tool_name.and_then(|name| self.registry.by_name(name)) else {
            let name = tool_name.unwrap_or_default().to_string();
            debug!("Tool call for '{}': not found", name);
            return ExecutionOutcome::ToolNotFound { name };
        };

        if !principal.has_scope(&tool.required_scope) {
            debug!(
                "Tool call for '{}' by '{}': denied, missing scope '{}'",
                tool.name, principal.subject, tool.required_scope
            );
            return ExecutionOutcome::ScopeDenied {
                tool: tool.name.clone(),
                missing_scope: tool.required_scope.clone(),
            };
        }

        if tool.is_destructive() {
            info!(
                "Tool call for '{}' by '{}': paused for confirmation",
                tool.name, principal.subject
            );
            return ExecutionOutcome::PendingConfirmation(Elicitation::confirm(tool));
        }

        debug!(
            "Tool call for '{}' by '{}': executing in {} sandbox",
            tool.name,
            principal.subject,
            self.sandbox.kind()
        );
        match self.sandbox.execute(&tool.name, params).await {
            Ok(result) => {
                debug!("Tool call for '{}': completed", tool.name);
                ExecutionOutcome::Success(result)
            }
            Err(e) => {
                error!("Sandbox execution of '{}' failed: {}", tool.name, e);
                ExecutionOutcome::SandboxError {
                    message: e.to_string(),
                }
            }
        }
    }
}
