//! Blueprint CLI - A declarative blueprint composer
//!
//! A blueprint descriptor names buildable units, actions, action flows, and
//! includes. This crate resolves includes recursively (fetching resources,
//! merging nested blueprints with local-wins precedence) into a single model
//! for a downstream generator, and executes actions, flows, and
//! listener-triggered invocations over that model.

pub mod cli;
pub mod domain;
pub mod exec;
pub mod resolve;
pub mod storage;

pub use domain::{ActionFlow, ActionRef, ActionTarget, ActionValue, Metadata, Unit};
pub use exec::{ActionRunner, CommandExecutor, ListenerDispatcher, ShellExecutor};
pub use resolve::{Blueprint, Registry, Resource, ResourceManager};
