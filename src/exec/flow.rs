//! Action flow evaluation
//!
//! A flow runs its steps in order, threading one value through the chain.
//! Evaluation begins with the caller's input (or nothing). A step with a
//! condition runs it as a shell predicate against the prior value: exit 0
//! executes the step, anything else skips it and carries the prior value
//! unchanged. An executed step's result becomes the new prior value. The
//! first failing action aborts the rest of the flow; completed steps are
//! not rolled back.

use super::action::ActionRunner;
use super::executor::ExecError;
use crate::domain::ActionFlow;

impl ActionRunner {
    /// Evaluates the named flow, returning the final threaded value
    pub fn run_flow(&self, name: &str, input: Option<&str>) -> Result<Option<String>, ExecError> {
        let flow = self
            .registry()
            .flow(name)
            .ok_or_else(|| ExecError::FlowNotFound {
                flow: name.to_string(),
            })?
            .clone();

        self.evaluate_flow(&flow, input)
    }

    /// Evaluates a flow value directly
    pub fn evaluate_flow(
        &self,
        flow: &ActionFlow,
        input: Option<&str>,
    ) -> Result<Option<String>, ExecError> {
        let mut prior: Option<String> = input.map(str::to_string);

        for step in &flow.steps {
            if let Some(condition) = &step.condition {
                let verdict = self.executor().execute(condition, prior.as_deref())?;
                if !verdict.success() {
                    continue;
                }
            }

            let outcome = self.perform_target(&step.target, prior.as_deref())?;
            prior = Some(outcome.value().to_string());
        }

        Ok(prior)
    }
}
