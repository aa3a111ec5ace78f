//! Project layout
//!
//! A project is any directory with a `blueprint.yaml` at its root. Derived
//! state lives under `.bp/`: fetched resources, per-include generation
//! subtrees, and configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::Config;

/// The descriptor filename recognized at a project or include root
pub const DESCRIPTOR_FILE: &str = "blueprint.yaml";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not in a blueprint project (no {DESCRIPTOR_FILE} found). Run 'bp init' first.")]
    NotInProject,

    #[error("descriptor not found at {0}")]
    DescriptorMissing(PathBuf),
}

/// A blueprint project rooted at a descriptor file
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let descriptor = root.join(DESCRIPTOR_FILE);

        if !descriptor.is_file() {
            return Err(ProjectError::DescriptorMissing(descriptor).into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Self::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        let bp_dir = root.join(".bp");
        fs::create_dir_all(&bp_dir)
            .with_context(|| format!("Failed to create .bp directory: {}", bp_dir.display()))?;

        let descriptor = root.join(DESCRIPTOR_FILE);
        if !descriptor.exists() {
            let name = root
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("project");

            let skeleton = format!(
                r#"metadata:
  name: {name}
  version: 0.1.0

units: {{}}

actions: {{}}

action_flows: {{}}

include: {{}}
"#
            );
            fs::write(&descriptor, skeleton)
                .with_context(|| format!("Failed to write descriptor: {}", descriptor.display()))?;
        }

        let gitignore_path = bp_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Fetched resources are re-materialized on resolve
resources/
resources.lock

# Generation output
gen/
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Finds the project root by walking up for a `blueprint.yaml`
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(DESCRIPTOR_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the descriptor path at the project root
    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join(DESCRIPTOR_FILE)
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the `.bp` directory path
    pub fn bp_dir(&self) -> PathBuf {
        self.root.join(".bp")
    }

    /// Returns the root of the generation tree
    pub fn gen_dir(&self) -> PathBuf {
        self.bp_dir().join("gen")
    }

    /// Returns the directory fetched resources are materialized into
    pub fn resources_dir(&self) -> PathBuf {
        match self.config.project.resource_dir {
            Some(ref dir) => self.root.join(dir),
            None => self.bp_dir().join("resources"),
        }
    }

    /// Returns the lock file guarding resource cache population
    pub fn resources_lock_path(&self) -> PathBuf {
        self.bp_dir().join("resources.lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.descriptor_path().is_file());
        assert!(project.bp_dir().is_dir());
        assert!(project.bp_dir().join(".gitignore").is_file());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();

        Project::init(dir.path()).unwrap();
        Project::init(dir.path()).unwrap();

        assert!(dir.path().join(DESCRIPTOR_FILE).is_file());
    }

    #[test]
    fn init_does_not_clobber_existing_descriptor() {
        let dir = TempDir::new().unwrap();
        let descriptor = dir.path().join(DESCRIPTOR_FILE);
        std::fs::write(&descriptor, "metadata:\n  name: existing\n").unwrap();

        Project::init(dir.path()).unwrap();

        let content = std::fs::read_to_string(&descriptor).unwrap();
        assert!(content.contains("existing"));
    }

    #[test]
    fn open_non_project_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Project::open(dir.path()).is_err());
    }

    #[test]
    fn default_resource_dir_is_under_bp() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.resources_dir().starts_with(project.bp_dir()));
    }
}
