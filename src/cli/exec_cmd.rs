//! Action, flow, and event commands

use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::exec::{ActionRunner, ListenerDispatcher, ShellExecutor};
use crate::resolve::{Blueprint, Registry, ResourceManager};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum FlowCommands {
    /// List the action flows of the resolved blueprint
    List,

    /// Run an action flow
    Run {
        /// Flow name
        name: String,

        /// Initial value threaded into the first step
        #[arg(long)]
        input: Option<String>,
    },
}

/// Loads the current project and builds a runner over its merged registry
fn load_runner(output: &Output) -> Result<ActionRunner> {
    let project = Project::open_current()?;
    let manager = ResourceManager::for_project(&project);

    output.verbose_ctx(
        "load",
        &format!("Resolving blueprint at {}", project.descriptor_path().display()),
    );
    let blueprint = Blueprint::load_root(&project, &manager)?;

    let registry = Arc::new(Registry::build(&blueprint));
    let executor = Arc::new(ShellExecutor::new(
        project.config().project.shell.clone(),
        project.root(),
    ));

    Ok(ActionRunner::new(registry, executor))
}

/// `bp run <action>` — the direct `perform_action` entry point
pub fn run_action(
    output: &Output,
    action: &str,
    unit: Option<&str>,
    input: Option<&str>,
) -> Result<()> {
    let runner = load_runner(output)?;
    let outcome = runner.perform_action(unit, action, input)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "action": action,
            "unit": unit,
            "status": outcome.status,
            "value": outcome.value(),
        }));
    } else if !outcome.stdout.is_empty() {
        print!("{}", outcome.stdout);
    }

    Ok(())
}

pub fn run_flow_cmd(cmd: FlowCommands, output: &Output) -> Result<()> {
    match cmd {
        FlowCommands::List => list_flows(output),
        FlowCommands::Run { name, input } => run_flow(output, &name, input.as_deref()),
    }
}

fn list_flows(output: &Output) -> Result<()> {
    let runner = load_runner(output)?;

    if output.is_json() {
        let flows: Vec<_> = runner
            .registry()
            .flows()
            .map(|(name, flow)| {
                serde_json::json!({
                    "name": name,
                    "steps": flow.steps.len(),
                    "listener": flow.listener,
                })
            })
            .collect();
        output.data(&flows);
    } else {
        for (name, flow) in runner.registry().flows() {
            output.row(&[name, &format!("{} step(s)", flow.steps.len())]);
        }
    }

    Ok(())
}

fn run_flow(output: &Output, name: &str, input: Option<&str>) -> Result<()> {
    let runner = load_runner(output)?;
    let result = runner.run_flow(name, input)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "flow": name,
            "result": result,
        }));
    } else if let Some(value) = result {
        println!("{}", value);
    }

    Ok(())
}

/// `bp emit <event>` — fire listener bindings for an event
pub fn emit(output: &Output, event: &str, value: Option<&str>) -> Result<()> {
    let runner = load_runner(output)?;
    let dispatcher = ListenerDispatcher::new(runner);

    let started = dispatcher.emit(event, value);
    output.verbose_ctx("emit", &format!("Started {started} listener invocation(s)"));

    // The process would otherwise exit under running listeners; results
    // still never reach us.
    dispatcher.wait_idle();

    output.success(&format!(
        "Event '{event}' dispatched to {started} listener(s)"
    ));

    Ok(())
}
