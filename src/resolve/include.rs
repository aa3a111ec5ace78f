//! Resolved includes
//!
//! After resolution an include carries its fetched resource, a generation
//! subtree scoped to it, and — depending on what the fetch found — either a
//! nested [`Blueprint`](super::Blueprint) or a synthetic wrapper
//! [`Unit`](crate::domain::Unit).

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use super::blueprint::{Blueprint, LoadError};
use super::resource::{Resource, ResourceError};
use crate::domain::{IncludeSpec, Unit};

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The include name is declared but has no descriptor value
    #[error("include '{name}' not found")]
    IncludeNotFound { name: String },

    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// The include graph revisited a resource already on the resolution stack
    #[error("include cycle detected at '{name}' ({})", path.display())]
    IncludeCycle { name: String, path: PathBuf },

    /// The nested descriptor exists but fails to load
    #[error("nested blueprint of include '{name}' failed to load: {source}")]
    Nested {
        name: String,
        #[source]
        source: Box<LoadError>,
    },
}

/// One include's resolution failure, qualified by its path in the include
/// tree (`parent/child` for failures bubbled up from nested blueprints)
#[derive(Debug)]
pub struct ResolveFailure {
    pub include: String,
    pub error: ResolveError,
}

/// An include entry of a blueprint, before and after resolution
#[derive(Debug, Clone, Serialize)]
pub struct Include {
    /// The normalized descriptor; absent when the include was declared with
    /// no value (which fails that include's resolution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<IncludeSpec>,

    /// The fetched materialization, set by resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,

    /// Generation subtree owned by this include
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gen_root: Option<PathBuf>,

    /// Nested blueprint, when the resource contains a descriptor.
    /// Exclusively owned by this entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<Box<Blueprint>>,

    /// Synthetic wrapper unit, when the resource contains a recognized
    /// package-definition file instead of a descriptor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}

impl Include {
    /// Creates an unresolved include from a normalized spec
    pub fn pending(spec: Option<IncludeSpec>) -> Self {
        Self {
            spec,
            resource: None,
            gen_root: None,
            blueprint: None,
            unit: None,
        }
    }

    /// Returns true once resolution has attached a resource
    pub fn is_resolved(&self) -> bool {
        self.resource.is_some()
    }
}
