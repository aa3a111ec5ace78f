//! External command execution
//!
//! Action commands are opaque strings handed to a shell. Execution sits
//! behind the [`CommandExecutor`] trait and returns a structured result
//! (exit status plus captured output) so tests can substitute fakes and
//! callers never lose the failure signal.

use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

/// The environment variable carrying the threaded input value
pub const INPUT_VAR: &str = "BP_INPUT";

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("command for '{action}' not found{}", scope_suffix(unit.as_deref()))]
    CommandNotFound {
        action: String,
        unit: Option<String>,
    },

    #[error("unit '{unit}' not found")]
    UnitNotFound { unit: String },

    #[error("action flow '{flow}' not found")]
    FlowNotFound { flow: String },

    #[error("action reference cycle detected at '${unit}.{action}'")]
    ActionCycle { unit: String, action: String },

    #[error("command '{command}' exited with status {status}")]
    CommandFailed { command: String, status: i32 },

    #[error("failed to run command '{command}': {reason}")]
    Spawn { command: String, reason: String },
}

fn scope_suffix(unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!(" on unit '{unit}'"),
        None => " at blueprint scope".to_string(),
    }
}

/// Structured result of one command execution
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    /// Process exit status (-1 when terminated by signal)
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutcome {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// The result value threaded into flow steps: stdout without its
    /// trailing newline
    pub fn value(&self) -> &str {
        self.stdout.trim_end_matches(['\r', '\n'])
    }
}

/// Capability to run an external command.
///
/// `input` is the threaded value from a flow (or an explicit caller), made
/// visible to the command through the `BP_INPUT` environment variable.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &str, input: Option<&str>) -> Result<ExecOutcome, ExecError>;
}

/// Runs commands through `<shell> -c`, in the project root
pub struct ShellExecutor {
    shell: String,
    workdir: PathBuf,
}

impl ShellExecutor {
    pub fn new(shell: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
            workdir: workdir.into(),
        }
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(&self, command: &str, input: Option<&str>) -> Result<ExecOutcome, ExecError> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command).current_dir(&self.workdir);

        if let Some(input) = input {
            cmd.env(INPUT_VAR, input);
        } else {
            cmd.env_remove(INPUT_VAR);
        }

        let output = cmd.output().map_err(|e| ExecError::Spawn {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

        Ok(ExecOutcome {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn executor(dir: &TempDir) -> ShellExecutor {
        ShellExecutor::new("sh", dir.path())
    }

    #[test]
    fn captures_stdout_and_status() {
        let dir = TempDir::new().unwrap();
        let outcome = executor(&dir).execute("echo hello", None).unwrap();

        assert!(outcome.success());
        assert_eq!(outcome.value(), "hello");
    }

    #[test]
    fn nonzero_exit_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        let outcome = executor(&dir).execute("exit 3", None).unwrap();

        assert!(!outcome.success());
        assert_eq!(outcome.status, 3);
    }

    #[test]
    fn input_is_visible_in_environment() {
        let dir = TempDir::new().unwrap();
        let outcome = executor(&dir)
            .execute("printf %s \"$BP_INPUT\"", Some("threaded"))
            .unwrap();

        assert_eq!(outcome.stdout, "threaded");
    }

    #[test]
    fn missing_shell_is_a_spawn_error() {
        let dir = TempDir::new().unwrap();
        let executor = ShellExecutor::new("definitely-not-a-shell", dir.path());

        assert!(matches!(
            executor.execute("echo hi", None),
            Err(ExecError::Spawn { .. })
        ));
    }

    #[test]
    fn value_trims_trailing_newline_only() {
        let outcome = ExecOutcome {
            status: 0,
            stdout: "  spaced  \n".to_string(),
            stderr: String::new(),
        };

        assert_eq!(outcome.value(), "  spaced  ");
    }
}
