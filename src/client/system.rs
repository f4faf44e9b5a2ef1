//! Host-backed executor
//!
//! Spawns real processes through `tokio::process`. Every child is created
//! with `kill_on_drop(true)`, so a run that times out kills its process when
//! the pending future is dropped.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::process::Command;
use tracing::debug;

use super::executor::{Executor, MessageStream, ToolCommand, ToolError, ToolOutput, ToolResult};
use super::stream::ChildStream;

/// Executor backed by the local host
#[derive(Debug, Clone, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    pub fn new() -> Self {
        Self
    }
}

fn spawn_error(program: &str, err: std::io::Error) -> ToolError {
    if err.kind() == ErrorKind::NotFound {
        ToolError::NotFound {
            program: program.to_string(),
        }
    } else {
        ToolError::Io(err)
    }
}

#[async_trait]
impl Executor for SystemExecutor {
    async fn run(&self, cmd: &ToolCommand) -> ToolResult<ToolOutput> {
        debug!(command = %cmd, timeout_ms = cmd.timeout.as_millis(), "Running tool");
        let start = Instant::now();

        let child = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&cmd.program, e))?;

        // On timeout the wait future is dropped, which drops and kills the child.
        match tokio::time::timeout(cmd.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ToolOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                duration: start.elapsed(),
            }),
            Ok(Err(e)) => Err(ToolError::Io(e)),
            Err(_) => Err(ToolError::Timeout {
                program: cmd.program.clone(),
                after: cmd.timeout,
            }),
        }
    }

    async fn connect(&self, host: &str, port: u16, timeout: Duration) -> ToolResult<()> {
        debug!(host = %host, port, "Opening TCP connection");
        match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => {
                drop(stream);
                Ok(())
            }
            Ok(Err(e)) => Err(ToolError::Io(e)),
            Err(_) => Err(ToolError::Timeout {
                program: format!("tcp://{host}:{port}"),
                after: timeout,
            }),
        }
    }

    async fn stream(&self, cmd: &ToolCommand) -> ToolResult<Box<dyn MessageStream>> {
        debug!(command = %cmd, "Spawning stream");
        let child = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&cmd.program, e))?;

        Ok(Box::new(ChildStream::new(child)))
    }

    async fn read_text(&self, path: &Path) -> ToolResult<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ToolError::Unreadable {
                path: path.display().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let exec = SystemExecutor::new();
        let cmd = ToolCommand::new("devready-no-such-tool", Duration::from_secs(1));
        let err = exec.run(&cmd).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_file_is_unreadable() {
        let exec = SystemExecutor::new();
        let err = exec
            .read_text(Path::new("/nonexistent/devready/config.h"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Unreadable { .. }));
    }
}
