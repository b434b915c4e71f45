//! Process execution seam.
//!
//! Every interaction with the Aptos CLI goes through a [`CommandRunner`], so orchestration logic
//! can be exercised against a fake without spawning real processes.

use async_trait::async_trait;
use log::debug;
use snafu::Snafu;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::process::Stdio;

/// Flags whose value must never be printed.
const SECRET_FLAGS: &[&str] = &["--private-key"];

/// A program plus its arguments, kept as separate tokens so no shell quoting is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn flag(self, name: &str, value: impl Into<String>) -> Self {
        self.arg(name).arg(value)
    }

    /// The value following `name`, if the flag is present.
    pub fn flag_value(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == name)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl Display for CommandLine {
    /// Space-joined command line with secret flag values redacted.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.program)?;
        let mut redact_next = false;
        for arg in &self.args {
            if redact_next {
                write!(f, " ****")?;
            } else {
                write!(f, " {}", arg)?;
            }
            redact_next = SECRET_FLAGS.contains(&arg.as_str());
        }
        Ok(())
    }
}

/// Exit status of a finished command. `code` is `None` when the process was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    pub code: Option<i32>,
}

impl CommandStatus {
    pub const SUCCESS: CommandStatus = CommandStatus { code: Some(0) };

    pub fn failure(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for CommandStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl Display for CommandStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum CommandError {
    #[snafu(display("Failed to run `{command}`: {source}"))]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("`{command}` exited with {status}"))]
    NonZeroExit {
        command: String,
        status: CommandStatus,
    },
}

#[async_trait]
/// Runs a command to completion with inherited standard streams and reports its exit status.
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandLine) -> Result<CommandStatus, CommandError>;
}

/// Runs a command and turns a non-zero exit into [`CommandError::NonZeroExit`].
pub async fn run_checked(
    runner: &dyn CommandRunner,
    command: &CommandLine,
) -> Result<(), CommandError> {
    let status = runner.run(command).await?;
    if status.success() {
        Ok(())
    } else {
        Err(CommandError::NonZeroExit {
            command: command.to_string(),
            status,
        })
    }
}

/// Spawns real processes, inheriting stdin, stdout and stderr so the tool's output reaches
/// the test log.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, command: &CommandLine) -> Result<CommandStatus, CommandError> {
        debug!("Running `{}`", command);

        let status = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;

        debug!("`{}` finished with {}", command, CommandStatus::from(status));
        Ok(status.into())
    }
}
