//! Executor trait and supporting types
//!
//! A single capability for "run a bounded external operation". Each call
//! either completes within its timeout or is torn down before returning.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by external operations
#[derive(Debug, Error)]
pub enum ToolError {
    /// The helper program is not installed
    #[error("{program} not available")]
    NotFound { program: String },

    /// The operation exceeded its bound and was torn down
    #[error("{program} timed out after {after:?}")]
    Timeout { program: String, after: Duration },

    /// A file could not be opened or read
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Whether this error means the helper program is missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, ToolError::NotFound { .. })
    }
}

/// Result type for executor operations
pub type ToolResult<T> = Result<T, ToolError>;

/// An external program invocation with its time bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ToolCommand {
    /// Create a command with no arguments
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl std::fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured output of a finished process
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Exit code, absent if the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ToolOutput {
    /// Whether the process exited with status zero
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A live line-oriented output stream from a long-running process
///
/// Reads never block: the monitor polls on its own schedule.
#[async_trait]
pub trait MessageStream: Send {
    /// Next buffered line, if one has arrived
    fn try_next_line(&mut self) -> Option<String>;

    /// Whether the producer has exited and all of its output is buffered
    fn has_exited(&mut self) -> bool;

    /// Stop the producer and wait up to `grace` for it to exit
    async fn terminate(&mut self, grace: Duration) -> ToolResult<()>;
}

/// Host capabilities used by the checks
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a program to completion within its timeout
    async fn run(&self, cmd: &ToolCommand) -> ToolResult<ToolOutput>;

    /// Open and immediately close a TCP connection
    async fn connect(&self, host: &str, port: u16, timeout: Duration) -> ToolResult<()>;

    /// Spawn a program whose stdout lines are consumed incrementally
    ///
    /// The command timeout is ignored; the caller owns the stream lifetime.
    async fn stream(&self, cmd: &ToolCommand) -> ToolResult<Box<dyn MessageStream>>;

    /// Read a text file in full
    async fn read_text(&self, path: &Path) -> ToolResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_and_display() {
        let cmd = ToolCommand::new("ping", Duration::from_secs(10))
            .arg("-c")
            .args(["3", "8.8.8.8"]);
        assert_eq!(cmd.args, vec!["-c", "3", "8.8.8.8"]);
        assert_eq!(cmd.to_string(), "ping -c 3 8.8.8.8");
    }

    #[test]
    fn test_output_success() {
        let mut out = ToolOutput::default();
        assert!(!out.success());
        out.exit_code = Some(0);
        assert!(out.success());
        out.exit_code = Some(1);
        assert!(!out.success());
    }

    #[test]
    fn test_error_kinds() {
        let missing = ToolError::NotFound {
            program: "avahi-browse".into(),
        };
        assert!(missing.is_not_found());
        assert_eq!(missing.to_string(), "avahi-browse not available");

        let slow = ToolError::Timeout {
            program: "ping".into(),
            after: Duration::from_secs(10),
        };
        assert!(!slow.is_not_found());
    }
}
