//! # guard-sandbox
//!
//! Isolated execution of tool invocations admitted by the resource server.
//!
//! ## Components
//!
//! - **Executor:** the [`SandboxExecutor`] trait, the only boundary between an authorized
//!   tool call and the code that performs it.
//! - **Simulated:** [`SimulatedSandbox`], in-process canned handlers for the demo catalog.
//! - **Process:** [`ProcessSandbox`], runs each call in a child process with a scrubbed
//!   environment and a hard timeout.
//!
//! The executor only ever receives a tool name and its parameters. Caller credentials never
//! cross this boundary, so nothing downstream of the sandbox can replay them.

pub mod error;
pub mod process;
pub mod simulated;

pub use crate::error::SandboxError;
pub use crate::process::{ProcessSandbox, ProcessSandboxBuilder};
pub use crate::simulated::SimulatedSandbox;

use async_trait::async_trait;
use serde_json::Value;

/// Trait defining how an authorized tool call is carried out
#[async_trait]
pub trait SandboxExecutor: Send + Sync {
    /// Runs `tool_name` with `params` and returns the tool's result payload
    async fn execute(&self, tool_name: &str, params: &Value) -> Result<Value, SandboxError>;

    /// Short name used in logs
    fn kind(&self) -> &'static str;
}
