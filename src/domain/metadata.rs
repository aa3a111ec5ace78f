//! Blueprint metadata
//!
//! Identifies the owning project. The name namespaces resource keys for
//! includes, so two sibling includes with the same name under different
//! blueprints never collide in the resource cache.

use serde::{Deserialize, Serialize};

/// Identity of a blueprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Project name (mandatory in the descriptor)
    pub name: String,

    /// Project version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Metadata {
    /// Creates metadata with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: None,
        }
    }

    /// Computes the resource key for an include owned by this blueprint
    pub fn resource_key(&self, include_name: &str) -> String {
        format!("{}-{}", self.name, include_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_key_is_namespaced_by_blueprint() {
        let a = Metadata::named("app");
        let b = Metadata::named("lib");

        assert_eq!(a.resource_key("foo"), "app-foo");
        assert_eq!(b.resource_key("foo"), "lib-foo");
        assert_ne!(a.resource_key("foo"), b.resource_key("foo"));
    }
}
