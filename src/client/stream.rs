//! Line stream over a child process's stdout

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::executor::{MessageStream, ToolError, ToolResult};

/// Stdout lines of a running child, forwarded through a channel
///
/// A reader task pushes each line as it arrives so that polling never
/// blocks. The stream counts as exited only once the child has exited and
/// the reader has hit end of file, so no trailing line is lost.
pub struct ChildStream {
    child: Child,
    lines: mpsc::UnboundedReceiver<String>,
    reader: JoinHandle<()>,
}

impl ChildStream {
    /// Wrap a child spawned with a piped stdout
    pub fn new(mut child: Child) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let stdout = child.stdout.take();

        let reader = tokio::spawn(async move {
            let Some(stdout) = stdout else {
                return;
            };
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!(error = %e, "Stream read failed");
                        break;
                    }
                }
            }
        });

        Self {
            child,
            lines: rx,
            reader,
        }
    }
}

#[async_trait]
impl MessageStream for ChildStream {
    fn try_next_line(&mut self) -> Option<String> {
        self.lines.try_recv().ok()
    }

    fn has_exited(&mut self) -> bool {
        let exited = !matches!(self.child.try_wait(), Ok(None));
        exited && self.reader.is_finished()
    }

    async fn terminate(&mut self, grace: Duration) -> ToolResult<()> {
        if let Err(e) = self.child.start_kill() {
            // Already reaped children report InvalidInput here.
            debug!(error = %e, "Kill request not delivered");
        }

        let result = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ToolError::Io(e)),
            Err(_) => {
                warn!(grace_ms = grace.as_millis(), "Stream did not exit within grace period");
                Err(ToolError::Timeout {
                    program: "subscription".to_string(),
                    after: grace,
                })
            }
        };
        self.reader.abort();
        result
    }
}

impl Drop for ChildStream {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
