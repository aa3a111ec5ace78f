//! Action invocation over the merged registry
//!
//! Resolves an action at blueprint or unit scope, follows reference chains
//! with cycle detection, and runs the resolved command through the executor.

use std::collections::HashSet;
use std::sync::Arc;

use super::executor::{CommandExecutor, ExecError, ExecOutcome};
use crate::domain::{ActionTarget, ActionValue};
use crate::resolve::Registry;

/// Runs actions and flows against one registry
#[derive(Clone)]
pub struct ActionRunner {
    registry: Arc<Registry>,
    executor: Arc<dyn CommandExecutor>,
}

impl ActionRunner {
    pub fn new(registry: Arc<Registry>, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { registry, executor }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn executor(&self) -> &dyn CommandExecutor {
        self.executor.as_ref()
    }

    /// Performs an action: at blueprint scope when `unit` is absent,
    /// otherwise on the named unit.
    ///
    /// `input` is passed to the resolved command as its invocation value.
    pub fn perform_action(
        &self,
        unit: Option<&str>,
        action: &str,
        input: Option<&str>,
    ) -> Result<ExecOutcome, ExecError> {
        let mut visiting = HashSet::new();
        self.perform_inner(unit, action, input, &mut visiting)
    }

    /// Performs a parsed invocation target
    pub fn perform_target(
        &self,
        target: &ActionTarget,
        input: Option<&str>,
    ) -> Result<ExecOutcome, ExecError> {
        self.perform_action(target.unit.as_deref(), &target.action, input)
    }

    fn perform_inner(
        &self,
        unit: Option<&str>,
        action: &str,
        input: Option<&str>,
        visiting: &mut HashSet<(String, String)>,
    ) -> Result<ExecOutcome, ExecError> {
        // Blueprint scope uses the empty unit name; unit names are never
        // empty, so the key cannot collide.
        let key = (unit.unwrap_or("").to_string(), action.to_string());
        if !visiting.insert(key) {
            return Err(ExecError::ActionCycle {
                unit: unit.unwrap_or("").to_string(),
                action: action.to_string(),
            });
        }

        let command = match unit {
            None => self.registry.action(action),
            Some(unit_name) => {
                let unit = self
                    .registry
                    .unit(unit_name)
                    .ok_or_else(|| ExecError::UnitNotFound {
                        unit: unit_name.to_string(),
                    })?;
                unit.action(action)
            }
        };

        let command = command.ok_or_else(|| ExecError::CommandNotFound {
            action: action.to_string(),
            unit: unit.map(str::to_string),
        })?;

        match command {
            ActionValue::Command(command) => {
                let outcome = self.executor.execute(command, input)?;
                if !outcome.success() {
                    return Err(ExecError::CommandFailed {
                        command: command.clone(),
                        status: outcome.status,
                    });
                }
                Ok(outcome)
            }
            ActionValue::Reference(reference) => {
                self.perform_inner(Some(&reference.unit), &reference.action, input, visiting)
            }
        }
    }
}
