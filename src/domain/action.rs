//! Action values and the action-reference grammar
//!
//! An action is either a literal external command or a reference to another
//! unit's action, written `$<unit>.<action>`. References are parsed into a
//! tagged variant at load time so that cycle detection and error messages
//! operate on structured data, never on prefix sniffing at execution time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionParseError {
    #[error("invalid action reference '{0}' (expected $<unit>.<action>)")]
    InvalidReference(String),

    #[error("invalid action target '{0}' (expected <unit>.<action> or <action>)")]
    InvalidTarget(String),
}

/// A reference to an action on a named unit (`$<unit>.<action>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionRef {
    /// The unit owning the action
    pub unit: String,
    /// The action name on that unit
    pub action: String,
}

impl ActionRef {
    /// Parses the `$<unit>.<action>` form
    pub fn parse(reference: &str) -> Result<Self, ActionParseError> {
        let invalid = || ActionParseError::InvalidReference(reference.to_string());

        let body = reference.strip_prefix('$').ok_or_else(invalid)?;
        let (unit, action) = body.split_once('.').ok_or_else(invalid)?;

        if !is_name(unit) || !is_name(action) {
            return Err(invalid());
        }

        Ok(Self {
            unit: unit.to_string(),
            action: action.to_string(),
        })
    }
}

impl std::fmt::Display for ActionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}.{}", self.unit, self.action)
    }
}

/// The value of a named action entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionValue {
    /// An opaque external command line
    Command(String),

    /// A reference to another unit's action
    Reference(ActionRef),
}

impl ActionValue {
    /// Parses an action definition string.
    ///
    /// Strings starting with `$` must match the reference grammar; anything
    /// else is taken verbatim as a command.
    pub fn parse(value: &str) -> Result<Self, ActionParseError> {
        if value.starts_with('$') {
            Ok(ActionValue::Reference(ActionRef::parse(value)?))
        } else {
            Ok(ActionValue::Command(value.to_string()))
        }
    }
}

/// An invocation target: an action at blueprint scope or on a named unit.
///
/// This is the form action-flow steps and listeners use: `<action>` for a
/// blueprint-scope action, `<unit>.<action>` for a unit action. A leading
/// `$` is accepted for symmetry with action references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTarget {
    /// The unit to look the action up on; blueprint scope when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// The action name
    pub action: String,
}

impl ActionTarget {
    /// Parses `<unit>.<action>`, `<action>`, or `$<unit>.<action>`
    pub fn parse(target: &str) -> Result<Self, ActionParseError> {
        let invalid = || ActionParseError::InvalidTarget(target.to_string());
        let body = target.strip_prefix('$').unwrap_or(target);

        match body.split_once('.') {
            Some((unit, action)) => {
                if !is_name(unit) || !is_name(action) {
                    return Err(invalid());
                }
                Ok(Self {
                    unit: Some(unit.to_string()),
                    action: action.to_string(),
                })
            }
            None => {
                if !is_name(body) {
                    return Err(invalid());
                }
                Ok(Self {
                    unit: None,
                    action: body.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{}.{}", unit, self.action),
            None => write!(f, "{}", self.action),
        }
    }
}

/// Valid unit/action names: identifier characters plus `-`
fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
