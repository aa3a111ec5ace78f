//! Blueprint loading, validation, and include resolution
//!
//! A blueprint aggregates the five descriptor buckets: units, actions,
//! action flows, includes, and metadata. Loading is fatal on a missing
//! mandatory field; include resolution is isolated per include so one
//! failing fetch never aborts its siblings.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;

use super::include::{Include, ResolveError, ResolveFailure};
use super::resource::{ResourceKind, ResourceManager};
use crate::domain::{
    ActionFlow, ActionParseError, ActionTarget, ActionValue, FlowStep, IncludeSpec,
    IncludeSpecError, ListenerSpec, ListenerTarget, Metadata, Unit,
};
use crate::storage::{Project, DESCRIPTOR_FILE};

/// Package-definition files recognized at a fetched resource's root.
/// Finding one wraps the resource as a synthetic unit instead of a blueprint.
const PACKAGE_FILES: &[&str] = &["flake.nix", "default.nix"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{field} is mandatory ({context})")]
    MissingMandatoryField { field: String, context: String },

    #[error(transparent)]
    InvalidInclude(#[from] IncludeSpecError),

    #[error("action '{name}' should be a string ({context})")]
    InvalidActionSpec { name: String, context: String },

    #[error(transparent)]
    InvalidActionReference(#[from] ActionParseError),

    #[error("unit '{name}' should be a mapping")]
    InvalidUnitSpec { name: String },

    #[error("invalid '{bucket}' section: {reason}")]
    InvalidBucket { bucket: String, reason: String },

    #[error("action flow '{flow}' is malformed: {reason}")]
    InvalidFlowSpec { flow: String, reason: String },

    #[error("descriptor is not a mapping: {}", path.display())]
    NotAMapping { path: PathBuf },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A resolved project descriptor
#[derive(Debug, Clone, Serialize)]
pub struct Blueprint {
    pub metadata: Metadata,
    pub units: BTreeMap<String, Unit>,
    pub actions: BTreeMap<String, ActionValue>,
    pub action_flows: BTreeMap<String, ActionFlow>,
    pub includes: BTreeMap<String, Include>,

    /// True for the project root, false for nested inclusions
    pub is_root: bool,

    /// Generation subtree owned by this blueprint
    pub gen_root: PathBuf,

    /// Directory of the descriptor, for resolving relative include URLs
    #[serde(skip)]
    pub(crate) config_dir: PathBuf,
}

impl Blueprint {
    /// Loads and fully resolves the root blueprint of a project.
    ///
    /// Fails if the descriptor is invalid or if any include (at any depth)
    /// failed to resolve; every failure is reported.
    pub fn load_root(project: &Project, manager: &ResourceManager) -> anyhow::Result<Self> {
        let descriptor = project.descriptor_path();
        let mut blueprint = Self::parse(&descriptor, project.gen_dir(), true)
            .with_context(|| format!("Failed to load {}", descriptor.display()))?;

        let mut visited = HashSet::new();
        if let Ok(canonical) = fs::canonicalize(project.root()) {
            visited.insert(canonical);
        }

        let failures = blueprint.resolve_includes(manager, &mut visited);
        if !failures.is_empty() {
            let details: Vec<String> = failures
                .iter()
                .map(|f| format!("  {}: {}", f.include, f.error))
                .collect();
            anyhow::bail!(
                "blueprint '{}': {} include(s) failed to resolve:\n{}",
                blueprint.metadata.name,
                failures.len(),
                details.join("\n")
            );
        }

        Ok(blueprint)
    }

    /// Parses and validates a descriptor without resolving its includes
    pub fn parse(
        descriptor_path: &Path,
        gen_root: PathBuf,
        is_root: bool,
    ) -> Result<Self, LoadError> {
        let content = fs::read_to_string(descriptor_path).map_err(|source| LoadError::Io {
            path: descriptor_path.to_path_buf(),
            source,
        })?;

        let doc: Value = serde_yaml::from_str(&content).map_err(|source| LoadError::Parse {
            path: descriptor_path.to_path_buf(),
            source,
        })?;

        let doc = doc.as_mapping().ok_or_else(|| LoadError::NotAMapping {
            path: descriptor_path.to_path_buf(),
        })?;

        let metadata = parse_metadata(doc.get("metadata"))?;

        let mut units = BTreeMap::new();
        for (name, value) in mapping_entries(doc.get("units"), "units")? {
            units.insert(name.clone(), parse_unit(&name, value)?);
        }

        let mut actions = BTreeMap::new();
        for (name, value) in mapping_entries(doc.get("actions"), "actions")? {
            actions.insert(name.clone(), parse_action(&name, value, "blueprint scope")?);
        }

        let mut action_flows = BTreeMap::new();
        for (name, value) in mapping_entries(doc.get("action_flows"), "action_flows")? {
            action_flows.insert(name.clone(), parse_flow(&name, value)?);
        }

        let mut includes = BTreeMap::new();
        for (name, value) in mapping_entries(doc.get("include"), "include")? {
            let spec = match value {
                Value::Null => None,
                other => Some(IncludeSpec::normalize(&name, other)?),
            };
            includes.insert(name, Include::pending(spec));
        }

        let config_dir = descriptor_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            metadata,
            units,
            actions,
            action_flows,
            includes,
            is_root,
            gen_root,
            config_dir,
        })
    }

    /// Resolves every include of this blueprint, recursing into nested ones.
    ///
    /// A failing include never aborts its siblings; all failures are
    /// collected and returned, with nested failures qualified by their path
    /// in the include tree.
    pub fn resolve_includes(
        &mut self,
        manager: &ResourceManager,
        visited: &mut HashSet<PathBuf>,
    ) -> Vec<ResolveFailure> {
        let names: Vec<String> = self.includes.keys().cloned().collect();
        let mut failures = Vec::new();

        for name in names {
            match self.resolve_include(&name, manager, visited) {
                Ok(nested_failures) => {
                    for failure in nested_failures {
                        failures.push(ResolveFailure {
                            include: format!("{}/{}", name, failure.include),
                            error: failure.error,
                        });
                    }
                }
                Err(error) => failures.push(ResolveFailure {
                    include: name,
                    error,
                }),
            }
        }

        failures
    }

    /// Resolves a single include by name.
    ///
    /// Fetches the resource, then inspects its root: a sibling descriptor
    /// becomes a nested blueprint, a recognized package-definition file
    /// becomes a synthetic wrapper unit, anything else is a terminal leaf.
    fn resolve_include(
        &mut self,
        name: &str,
        manager: &ResourceManager,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<Vec<ResolveFailure>, ResolveError> {
        let spec = self
            .includes
            .get(name)
            .and_then(|include| include.spec.clone())
            .ok_or_else(|| ResolveError::IncludeNotFound {
                name: name.to_string(),
            })?;

        let key = self.metadata.resource_key(name);
        let resource = manager.fetch(&key, &spec, &self.config_dir)?;
        let gen_root = self.gen_root.join(name);

        let mut child_blueprint = None;
        let mut synthetic_unit = None;
        let mut nested_failures = Vec::new();

        if resource.kind == ResourceKind::Directory {
            let nested_descriptor = resource.local_path.join(DESCRIPTOR_FILE);
            let package_file = PACKAGE_FILES
                .iter()
                .map(|f| resource.local_path.join(f))
                .find(|p| p.is_file());

            if nested_descriptor.is_file() {
                let identity = fs::canonicalize(&resource.local_path)
                    .unwrap_or_else(|_| resource.local_path.clone());

                if !visited.insert(identity.clone()) {
                    return Err(ResolveError::IncludeCycle {
                        name: name.to_string(),
                        path: identity,
                    });
                }

                let mut child = Blueprint::parse(&nested_descriptor, gen_root.clone(), false)
                    .map_err(|source| ResolveError::Nested {
                        name: name.to_string(),
                        source: Box::new(source),
                    })?;

                nested_failures = child.resolve_includes(manager, visited);
                visited.remove(&identity);

                child_blueprint = Some(Box::new(child));
            } else if let Some(package_file) = package_file {
                synthetic_unit = Some(Unit::wrapping(package_file.display().to_string()));
            }
            // Neither found: terminal leaf, recursion stops here.
        }

        if let Some(include) = self.includes.get_mut(name) {
            include.resource = Some(resource);
            include.gen_root = Some(gen_root);
            include.blueprint = child_blueprint;
            include.unit = synthetic_unit;
        }

        Ok(nested_failures)
    }
}

/// Iterates the entries of an optional top-level mapping bucket
fn mapping_entries<'a>(
    value: Option<&'a Value>,
    bucket: &str,
) -> Result<Vec<(String, &'a Value)>, LoadError> {
    let map = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Mapping(map)) => map,
        Some(_) => {
            return Err(LoadError::InvalidBucket {
                bucket: bucket.to_string(),
                reason: "should be a mapping".to_string(),
            })
        }
    };

    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        let name = key.as_str().ok_or_else(|| LoadError::InvalidBucket {
            bucket: bucket.to_string(),
            reason: "keys should be strings".to_string(),
        })?;
        entries.push((name.to_string(), value));
    }

    Ok(entries)
}

fn parse_metadata(value: Option<&Value>) -> Result<Metadata, LoadError> {
    let missing = |field: &str| LoadError::MissingMandatoryField {
        field: field.to_string(),
        context: "blueprint metadata".to_string(),
    };

    let map = match value {
        None | Some(Value::Null) => return Err(missing("metadata")),
        Some(Value::Mapping(map)) => map,
        Some(_) => return Err(missing("metadata")),
    };

    let name = map
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("name"))?;

    Ok(Metadata {
        name: name.to_string(),
        version: map
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string),
        description: map
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn parse_unit(name: &str, value: &Value) -> Result<Unit, LoadError> {
    let map = value.as_mapping().ok_or_else(|| LoadError::InvalidUnitSpec {
        name: name.to_string(),
    })?;

    let source = map
        .get("source")
        .and_then(Value::as_str)
        .ok_or_else(|| LoadError::MissingMandatoryField {
            field: "source".to_string(),
            context: format!("unit '{name}'"),
        })?
        .to_string();

    let instantiate = match map.get("instantiate") {
        None | Some(Value::Null) => None,
        Some(Value::Mapping(params)) => {
            let mut out = BTreeMap::new();
            for (key, val) in params {
                let key = key.as_str().ok_or_else(|| LoadError::InvalidUnitSpec {
                    name: name.to_string(),
                })?;
                out.insert(key.to_string(), val.clone());
            }
            Some(out)
        }
        Some(_) => {
            return Err(LoadError::InvalidUnitSpec {
                name: name.to_string(),
            })
        }
    };

    let actions = match map.get("actions") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let context = format!("unit '{name}'");
            let mut out = BTreeMap::new();
            for (action_name, action_value) in mapping_entries(Some(value), "actions")? {
                out.insert(
                    action_name.clone(),
                    parse_action(&action_name, action_value, &context)?,
                );
            }
            Some(out)
        }
    };

    let listener = match map.get("listener") {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_listener(name, value)?),
    };

    Ok(Unit {
        source,
        instantiate,
        actions,
        listener,
    })
}

fn parse_action(name: &str, value: &Value, context: &str) -> Result<ActionValue, LoadError> {
    let raw = value.as_str().ok_or_else(|| LoadError::InvalidActionSpec {
        name: name.to_string(),
        context: context.to_string(),
    })?;

    Ok(ActionValue::parse(raw)?)
}

fn parse_listener(unit_name: &str, value: &Value) -> Result<ListenerSpec, LoadError> {
    let missing = |field: &str| LoadError::MissingMandatoryField {
        field: field.to_string(),
        context: format!("listener of unit '{unit_name}'"),
    };

    let map = value.as_mapping().ok_or_else(|| missing("listener"))?;

    let event = map
        .get("event")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("event"))?
        .to_string();

    let action = map
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("action"))?;

    Ok(ListenerSpec {
        event,
        target: ListenerTarget::parse(action)?,
    })
}

fn parse_flow(name: &str, value: &Value) -> Result<ActionFlow, LoadError> {
    let malformed = |reason: &str| LoadError::InvalidFlowSpec {
        flow: name.to_string(),
        reason: reason.to_string(),
    };

    let (steps_value, listener) = match value {
        Value::Sequence(_) => (value, None),
        Value::Mapping(map) => {
            let steps = map.get("steps").ok_or_else(|| malformed("no steps"))?;
            let listener = match map.get("listener") {
                None | Some(Value::Null) => None,
                Some(Value::String(event)) => Some(event.clone()),
                Some(_) => return Err(malformed("listener should be an event name")),
            };
            (steps, listener)
        }
        _ => return Err(malformed("should be a sequence of steps")),
    };

    let raw_steps = steps_value
        .as_sequence()
        .ok_or_else(|| malformed("should be a sequence of steps"))?;

    let mut steps = Vec::with_capacity(raw_steps.len());
    for step in raw_steps {
        steps.push(parse_flow_step(name, step)?);
    }

    Ok(ActionFlow { steps, listener })
}

fn parse_flow_step(flow: &str, value: &Value) -> Result<FlowStep, LoadError> {
    match value {
        // Shorthand: a bare reference string is a step with no condition
        Value::String(target) => Ok(FlowStep {
            target: ActionTarget::parse(target)?,
            condition: None,
        }),
        Value::Mapping(map) => {
            let target = map.get("action").and_then(Value::as_str).ok_or_else(|| {
                LoadError::MissingMandatoryField {
                    field: "action".to_string(),
                    context: format!("step of action flow '{flow}'"),
                }
            })?;

            let condition = map
                .get("condition")
                .and_then(Value::as_str)
                .map(str::to_string);

            Ok(FlowStep {
                target: ActionTarget::parse(target)?,
                condition,
            })
        }
        _ => Err(LoadError::InvalidFlowSpec {
            flow: flow.to_string(),
            reason: "step should be a mapping or a reference string".to_string(),
        }),
    }
}
