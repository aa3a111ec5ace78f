//! Unit domain model
//!
//! Units are the buildable entities of a blueprint. Each carries an opaque
//! source reference, optional instantiation parameters, named actions, and
//! an optional listener binding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::action::{ActionParseError, ActionTarget, ActionValue};

/// A named buildable entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Provenance reference (mandatory in the descriptor)
    pub source: String,

    /// Instantiation parameters, passed through to the generator untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instantiate: Option<BTreeMap<String, serde_yaml::Value>>,

    /// Named actions on this unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<BTreeMap<String, ActionValue>>,

    /// Async trigger binding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listener: Option<ListenerSpec>,
}

impl Unit {
    /// Creates a unit that only wraps a source reference.
    ///
    /// Used for includes that resolve to an external package-definition file
    /// rather than a nested blueprint.
    pub fn wrapping(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            instantiate: None,
            actions: None,
            listener: None,
        }
    }

    /// Looks up an action defined on this unit
    pub fn action(&self, name: &str) -> Option<&ActionValue> {
        self.actions.as_ref()?.get(name)
    }
}

/// What a listener runs when its event fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerTarget {
    /// A single action (blueprint- or unit-scoped)
    Action(ActionTarget),
    /// A named action flow
    Flow(String),
}

impl ListenerTarget {
    /// Parses a listener action string; `flow:<name>` binds an action flow.
    pub fn parse(value: &str) -> Result<Self, ActionParseError> {
        match value.strip_prefix("flow:") {
            Some(flow) => Ok(ListenerTarget::Flow(flow.to_string())),
            None => Ok(ListenerTarget::Action(ActionTarget::parse(value)?)),
        }
    }
}

/// An async trigger binding: run `target` whenever `event` fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerSpec {
    /// The event this listener responds to
    pub event: String,

    /// The executable bound to the event
    pub target: ListenerTarget,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_unit_has_no_actions() {
        let unit = Unit::wrapping("flake.nix");
        assert_eq!(unit.source, "flake.nix");
        assert!(unit.actions.is_none());
        assert!(unit.action("build").is_none());
    }

    #[test]
    fn listener_target_action() {
        let target = ListenerTarget::parse("compiler.build").unwrap();
        assert!(matches!(target, ListenerTarget::Action(_)));
    }

    #[test]
    fn listener_target_flow() {
        let target = ListenerTarget::parse("flow:deploy").unwrap();
        assert_eq!(target, ListenerTarget::Flow("deploy".to_string()));
    }
}
