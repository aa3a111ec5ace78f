//! # Storage Layer
//!
//! Filesystem layout and configuration for Blueprint CLI.
//!
//! ## Project Structure
//!
//! ```text
//! blueprint.yaml            # Project descriptor (the blueprint)
//! .bp/
//! ├── gen/                  # Generation subtrees, one per include
//! │   └── <include>/...     # Nested includes nest further subtrees
//! ├── resources/            # Fetched include materializations
//! ├── resources.lock        # Guards resource cache population (fs2)
//! └── config.toml           # Project configuration
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for locating a blueprint project
//! - [`Config`] - Project and global configuration

mod config;
mod project;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig};
pub use project::{Project, ProjectError, DESCRIPTOR_FILE};
