//! Merged unit/action view over a resolved blueprint
//!
//! The registry flattens a blueprint and its include tree into one namespace.
//! Included definitions are collected first (depth-first), then the owning
//! blueprint's own definitions are overlaid: on a name collision the local
//! definition replaces the included one wholesale, never field by field.

use std::collections::BTreeMap;

use serde::Serialize;

use super::blueprint::Blueprint;
use crate::domain::{ActionFlow, ActionValue, ListenerTarget, Unit};

/// The merged view the evaluator and generator operate on
#[derive(Debug, Default, Clone, Serialize)]
pub struct Registry {
    units: BTreeMap<String, Unit>,
    actions: BTreeMap<String, ActionValue>,
    action_flows: BTreeMap<String, ActionFlow>,
}

impl Registry {
    /// Builds the merged registry for a resolved blueprint
    pub fn build(blueprint: &Blueprint) -> Self {
        let mut registry = Registry::default();

        for (name, include) in &blueprint.includes {
            if let Some(child) = &include.blueprint {
                let nested = Registry::build(child);
                registry.units.extend(nested.units);
                registry.actions.extend(nested.actions);
                registry.action_flows.extend(nested.action_flows);
            } else if let Some(unit) = &include.unit {
                // Synthetic wrapper unit, named after its include
                registry.units.insert(name.clone(), unit.clone());
            }
        }

        // Local definitions win, replacing included ones wholesale.
        registry.units.extend(blueprint.units.clone());
        registry.actions.extend(blueprint.actions.clone());
        registry.action_flows.extend(blueprint.action_flows.clone());

        registry
    }

    /// Looks up a unit by name
    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.get(name)
    }

    /// Looks up a blueprint-scope action by name
    pub fn action(&self, name: &str) -> Option<&ActionValue> {
        self.actions.get(name)
    }

    /// Looks up an action flow by name
    pub fn flow(&self, name: &str) -> Option<&ActionFlow> {
        self.action_flows.get(name)
    }

    /// Iterates all units
    pub fn units(&self) -> impl Iterator<Item = (&String, &Unit)> {
        self.units.iter()
    }

    /// Iterates all action flows
    pub fn flows(&self) -> impl Iterator<Item = (&String, &ActionFlow)> {
        self.action_flows.iter()
    }

    /// Collects every listener binding: unit listeners plus flows that
    /// declare a triggering event
    pub fn listener_bindings(&self) -> Vec<(String, ListenerTarget)> {
        let mut bindings = Vec::new();

        for unit in self.units.values() {
            if let Some(listener) = &unit.listener {
                bindings.push((listener.event.clone(), listener.target.clone()));
            }
        }

        for (name, flow) in &self.action_flows {
            if let Some(event) = &flow.listener {
                bindings.push((event.clone(), ListenerTarget::Flow(name.clone())));
            }
        }

        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Metadata;
    use crate::resolve::Include;
    use std::path::PathBuf;

    fn empty_blueprint(name: &str) -> Blueprint {
        Blueprint {
            metadata: Metadata::named(name),
            units: BTreeMap::new(),
            actions: BTreeMap::new(),
            action_flows: BTreeMap::new(),
            includes: BTreeMap::new(),
            is_root: true,
            gen_root: PathBuf::from(".bp/gen"),
            config_dir: PathBuf::from("."),
        }
    }

    fn unit_with_source(source: &str) -> Unit {
        Unit::wrapping(source)
    }

    #[test]
    fn local_unit_overrides_included_one() {
        let mut child = empty_blueprint("lib");
        child.is_root = false;
        child
            .units
            .insert("build".to_string(), unit_with_source("included-source"));

        let mut root = empty_blueprint("app");
        root.units
            .insert("build".to_string(), unit_with_source("local-source"));

        let mut include = Include::pending(None);
        include.blueprint = Some(Box::new(child));
        root.includes.insert("lib".to_string(), include);

        let registry = Registry::build(&root);
        assert_eq!(registry.unit("build").unwrap().source, "local-source");
    }

    #[test]
    fn included_units_are_visible() {
        let mut child = empty_blueprint("lib");
        child.is_root = false;
        child
            .units
            .insert("helper".to_string(), unit_with_source("lib-source"));

        let mut root = empty_blueprint("app");
        let mut include = Include::pending(None);
        include.blueprint = Some(Box::new(child));
        root.includes.insert("lib".to_string(), include);

        let registry = Registry::build(&root);
        assert_eq!(registry.unit("helper").unwrap().source, "lib-source");
    }

    #[test]
    fn synthetic_unit_is_named_after_include() {
        let mut root = empty_blueprint("app");
        let mut include = Include::pending(None);
        include.unit = Some(Unit::wrapping("/somewhere/flake.nix"));
        root.includes.insert("nixlib".to_string(), include);

        let registry = Registry::build(&root);
        assert_eq!(
            registry.unit("nixlib").unwrap().source,
            "/somewhere/flake.nix"
        );
    }

    #[test]
    fn flow_listeners_become_bindings() {
        let mut root = empty_blueprint("app");
        root.action_flows.insert(
            "deploy".to_string(),
            ActionFlow {
                steps: Vec::new(),
                listener: Some("pushed".to_string()),
            },
        );

        let bindings = Registry::build(&root).listener_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].0, "pushed");
        assert_eq!(bindings[0].1, ListenerTarget::Flow("deploy".to_string()));
    }
}
