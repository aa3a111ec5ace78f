//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{exec_cmd, resolve_cmd};
use crate::storage::Project;

#[derive(Parser)]
#[command(name = "bp")]
#[command(author, version, about = "Declarative blueprint composer for project build descriptions")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new blueprint project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Resolve the blueprint and print the merged model
    Resolve,

    /// Perform a single action
    Run {
        /// Action name
        action: String,

        /// Look the action up on this unit instead of blueprint scope
        #[arg(long)]
        unit: Option<String>,

        /// Value passed to the command (as $BP_INPUT)
        #[arg(long)]
        input: Option<String>,
    },

    /// Manage action flows
    #[command(subcommand)]
    Flow(exec_cmd::FlowCommands),

    /// Fire listeners bound to an event
    Emit {
        /// Event name
        event: String,

        /// The event's triggering value
        #[arg(long)]
        value: Option<String>,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("Blueprint CLI starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.success(&format!(
                "Initialized blueprint project at {}",
                project.root().display()
            ));
        }

        Commands::Resolve => resolve_cmd::run(&output)?,

        Commands::Run {
            action,
            unit,
            input,
        } => exec_cmd::run_action(&output, &action, unit.as_deref(), input.as_deref())?,

        Commands::Flow(cmd) => exec_cmd::run_flow_cmd(cmd, &output)?,

        Commands::Emit { event, value } => exec_cmd::emit(&output, &event, value.as_deref())?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
