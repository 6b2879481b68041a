//! Tool catalog and the invocation state machine

pub mod controller;
pub mod registry;

pub use controller::{Elicitation, ExecutionController, ExecutionOutcome};
pub use registry::{RiskTier, ToolDefinition, ToolRegistry};
