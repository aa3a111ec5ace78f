//! Blueprint resolution command
//!
//! `bp resolve` produces the fully resolved model: merged units, actions,
//! and flows, plus the include tree with local paths and nested blueprints.
//! This JSON payload is the handoff to the code generator.

use anyhow::Result;
use serde::Serialize;

use super::output::Output;
use crate::domain::Metadata;
use crate::resolve::{Blueprint, Include, Registry, ResourceManager};
use crate::storage::Project;

/// The generator handoff payload
#[derive(Serialize)]
struct ResolvedModel<'a> {
    metadata: &'a Metadata,
    #[serde(flatten)]
    registry: &'a Registry,
    includes: &'a std::collections::BTreeMap<String, Include>,
}

pub fn run(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let manager = ResourceManager::for_project(&project);

    output.verbose_ctx(
        "resolve",
        &format!("Loading {}", project.descriptor_path().display()),
    );

    let blueprint = Blueprint::load_root(&project, &manager)?;
    let registry = Registry::build(&blueprint);

    output.verbose_ctx(
        "resolve",
        &format!("Resolved {} include(s)", blueprint.includes.len()),
    );

    output.data(&ResolvedModel {
        metadata: &blueprint.metadata,
        registry: &registry,
        includes: &blueprint.includes,
    });

    Ok(())
}
