//! Domain models for Blueprint CLI
//!
//! Contains the descriptor model types without any I/O concerns.

mod action;
mod flow;
mod include;
mod metadata;
mod unit;

pub use action::{ActionParseError, ActionRef, ActionTarget, ActionValue};
pub use flow::{ActionFlow, FlowStep};
pub use include::{IncludeSpec, IncludeSpecError};
pub use metadata::Metadata;
pub use unit::{ListenerSpec, ListenerTarget, Unit};
