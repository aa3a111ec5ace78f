//! # Blueprint Resolution Engine
//!
//! Turns a raw descriptor into a fully resolved model for the generator.
//!
//! ## Pipeline
//!
//! ```text
//! blueprint.yaml
//!   │  Blueprint::parse        (validate buckets, normalize includes)
//!   ▼
//! Blueprint (includes unresolved)
//!   │  resolve_includes        (fetch resources, recurse into nested
//!   ▼                           blueprints, wrap package files as units)
//! Blueprint (include tree)
//!   │  Registry::build         (merge, local definitions win)
//!   ▼
//! Registry ──► generator / action execution
//! ```
//!
//! ## Key Types
//!
//! - [`Blueprint`] - Loader/validator and the resolved aggregate
//! - [`Registry`] - Merged unit/action view with local-wins override
//! - [`ResourceManager`] - Idempotent, lock-guarded include fetching
//! - [`ResourceFetcher`] - Transport seam (local filesystem in-tree)

mod blueprint;
mod include;
mod registry;
mod resource;

pub use blueprint::{Blueprint, LoadError};
pub use include::{Include, ResolveError, ResolveFailure};
pub use registry::Registry;
pub use resource::{
    LocalFetcher, Resource, ResourceError, ResourceFetcher, ResourceKind, ResourceManager,
};
