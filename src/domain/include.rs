//! Include specifications
//!
//! An include names an external dependency to resolve. The descriptor accepts
//! either a bare URL string (shorthand) or an explicit mapping; both normalize
//! to a mapping with a `url` field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IncludeSpecError {
    #[error("include '{0}' should be a string or a mapping")]
    InvalidShape(String),

    #[error("include '{0}' has no url")]
    MissingUrl(String),
}

/// The unresolved descriptor of an include
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeSpec {
    /// Where to fetch the include from
    pub url: String,

    /// Transport-specific extra fields, passed through to the fetcher
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl IncludeSpec {
    /// Creates a spec from a bare URL
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Normalizes a raw descriptor value into a spec.
    ///
    /// A bare string becomes `{url: <string>}`; a mapping passes through.
    /// Any other shape is rejected.
    pub fn normalize(name: &str, value: &serde_yaml::Value) -> Result<Self, IncludeSpecError> {
        match value {
            serde_yaml::Value::String(url) => Ok(Self::url(url.clone())),
            serde_yaml::Value::Mapping(map) => {
                let mut url = None;
                let mut extra = BTreeMap::new();

                for (key, val) in map {
                    let key = key
                        .as_str()
                        .ok_or_else(|| IncludeSpecError::InvalidShape(name.to_string()))?;
                    if key == "url" {
                        url = val.as_str().map(str::to_string);
                    } else {
                        extra.insert(key.to_string(), val.clone());
                    }
                }

                let url = url.ok_or_else(|| IncludeSpecError::MissingUrl(name.to_string()))?;
                Ok(Self { url, extra })
            }
            _ => Err(IncludeSpecError::InvalidShape(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_string_normalizes_to_url() {
        let value = serde_yaml::Value::String("github:org/repo".to_string());
        let spec = IncludeSpec::normalize("foo", &value).unwrap();

        assert_eq!(spec.url, "github:org/repo");
        assert!(spec.extra.is_empty());
    }

    #[test]
    fn mapping_passes_through() {
        let value: serde_yaml::Value =
            serde_yaml::from_str("url: ./vendor/lib\nref: v1.2").unwrap();
        let spec = IncludeSpec::normalize("lib", &value).unwrap();

        assert_eq!(spec.url, "./vendor/lib");
        assert_eq!(
            spec.extra.get("ref").and_then(|v| v.as_str()),
            Some("v1.2")
        );
    }

    #[test]
    fn mapping_without_url_is_rejected() {
        let value: serde_yaml::Value = serde_yaml::from_str("ref: v1.2").unwrap();
        assert_eq!(
            IncludeSpec::normalize("lib", &value),
            Err(IncludeSpecError::MissingUrl("lib".to_string()))
        );
    }

    #[test]
    fn other_shapes_are_rejected() {
        for yaml in ["42", "[a, b]", "true"] {
            let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
            assert_eq!(
                IncludeSpec::normalize("foo", &value),
                Err(IncludeSpecError::InvalidShape("foo".to_string())),
                "expected {yaml:?} to be rejected"
            );
        }
    }
}
