//! Action flow domain model
//!
//! A flow is an ordered chain of action invocations. Each step may declare a
//! skip condition; the result of each executed step is threaded into the next
//! as its input value.

use serde::{Deserialize, Serialize};

use super::action::ActionTarget;

/// One step of an action flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    /// The action to invoke
    pub target: ActionTarget,

    /// Skip condition evaluated against the prior value; the step runs when
    /// absent or true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// An ordered chain of action invocations at blueprint scope
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionFlow {
    /// Steps in execution order
    pub steps: Vec<FlowStep>,

    /// Event that triggers this flow asynchronously, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listener: Option<String>,
}
