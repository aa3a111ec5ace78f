//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project management | `init` |
//! | Resolve | Blueprint resolution | `resolve` |
//! | Execute | Actions and flows | `run`, `flow run`, `flow list` |
//! | Events | Listener dispatch | `emit` |
//!
//! ## Output Formats
//!
//! All commands support `--format`:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod exec_cmd;
mod output;
mod resolve_cmd;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
