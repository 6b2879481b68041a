//! Admission control for resource server routes

pub mod gate;

pub use gate::{AuthorizationDecision, AuthorizationGate, Principal, Rejection};
