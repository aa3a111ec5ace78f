//! # Action Execution
//!
//! Runs actions, action flows, and listener-triggered invocations over a
//! merged [`Registry`](crate::resolve::Registry).
//!
//! ## Execution model
//!
//! - `perform_action` is synchronous and blocking: a direct command runs to
//!   completion through the [`CommandExecutor`], a reference chain is
//!   resolved through the registry with cycle detection.
//! - Flows thread each step's result into the next as its input value;
//!   per-step conditions skip steps without consuming the value. Fail-fast,
//!   no rollback.
//! - Listener dispatch is the sole asynchronous path: fire-and-forget
//!   threads with no result propagation back to the emitter.

mod action;
mod executor;
mod flow;
mod listener;

pub use action::ActionRunner;
pub use executor::{CommandExecutor, ExecError, ExecOutcome, ShellExecutor};
pub use listener::ListenerDispatcher;
