#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use devready::client::{Executor, MessageStream, ToolCommand, ToolError, ToolOutput, ToolResult};
use devready::config::Settings;
use devready::{RunSummary, Runner};
use devready_testkit::fixtures;

/// Canned reply for one program invocation
#[derive(Debug, Clone)]
pub enum Reply {
    Exit { code: i32, stdout: String, stderr: String },
    Missing,
    Timeout,
}

impl Reply {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Reply::Exit {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn fail(code: i32, stderr: impl Into<String>) -> Self {
        Reply::Exit {
            code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Stream script: lines released at offsets from spawn, optional exit time
#[derive(Debug, Clone, Default)]
pub struct StreamScript {
    pub lines: Vec<(Duration, String)>,
    pub exit_after: Option<Duration>,
}

impl StreamScript {
    /// `count` lines spread evenly over `window`
    pub fn evenly(count: usize, window: Duration) -> Self {
        let step = window / (count as u32 + 1);
        let lines = (1..=count)
            .map(|i| {
                (
                    step * i as u32,
                    fixtures::message_line("/arduino", &format!("Device Arduino-{i} online")),
                )
            })
            .collect();
        Self {
            lines,
            exit_after: None,
        }
    }
}

pub struct ScriptedStream {
    created: Instant,
    pending: VecDeque<(Duration, String)>,
    exit_after: Option<Duration>,
    terminated: Arc<Mutex<bool>>,
}

#[async_trait]
impl MessageStream for ScriptedStream {
    fn try_next_line(&mut self) -> Option<String> {
        let due = self
            .pending
            .front()
            .is_some_and(|(at, _)| self.created.elapsed() >= *at);
        if due {
            self.pending.pop_front().map(|(_, line)| line)
        } else {
            None
        }
    }

    fn has_exited(&mut self) -> bool {
        self.exit_after
            .is_some_and(|after| self.created.elapsed() >= after)
    }

    async fn terminate(&mut self, _grace: Duration) -> ToolResult<()> {
        *self.terminated.lock() = true;
        Ok(())
    }
}

/// Executor answering from scripts and recording every call
#[derive(Default)]
pub struct ScriptedExecutor {
    replies: HashMap<String, Reply>,
    connect_ok: bool,
    stream: Option<StreamScript>,
    pub calls: Mutex<Vec<ToolCommand>>,
    pub connects: Mutex<Vec<(String, u16)>>,
    pub stream_terminated: Arc<Mutex<bool>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            connect_ok: true,
            ..Default::default()
        }
    }

    /// Reply for every run of `program`
    pub fn reply(mut self, program: &str, reply: Reply) -> Self {
        self.replies.insert(program.to_string(), reply);
        self
    }

    /// Reply for runs of `program` whose last argument is `last_arg`
    pub fn reply_for(mut self, program: &str, last_arg: &str, reply: Reply) -> Self {
        self.replies.insert(format!("{program} {last_arg}"), reply);
        self
    }

    pub fn refuse_connections(mut self) -> Self {
        self.connect_ok = false;
        self
    }

    pub fn with_stream(mut self, script: StreamScript) -> Self {
        self.stream = Some(script);
        self
    }

    /// A healthy host: gateway detected, every ping answers, one broker advertised
    pub fn healthy() -> Self {
        Self::new()
            .reply("ip", Reply::ok(fixtures::default_route("192.168.1.1")))
            .reply("ping", Reply::ok(fixtures::ping_output("host", 3, 12.5)))
            .reply(
                "avahi-browse",
                Reply::ok(fixtures::browse_output(&[fixtures::resolved_record(
                    "mosquitto",
                    "pi.local",
                    "192.168.1.20",
                    1883,
                )])),
            )
            .reply("mosquitto_pub", Reply::ok(""))
    }

    pub fn ran(&self, program: &str) -> bool {
        self.calls
            .lock()
            .iter()
            .any(|c| c.program == program)
    }

    pub fn calls_to(&self, program: &str) -> Vec<ToolCommand> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.program == program)
            .cloned()
            .collect()
    }

    fn lookup(&self, cmd: &ToolCommand) -> Option<Reply> {
        cmd.args
            .last()
            .and_then(|last| self.replies.get(&format!("{} {last}", cmd.program)))
            .or_else(|| self.replies.get(&cmd.program))
            .cloned()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn run(&self, cmd: &ToolCommand) -> ToolResult<ToolOutput> {
        self.calls.lock().push(cmd.clone());
        match self.lookup(cmd) {
            Some(Reply::Exit {
                code,
                stdout,
                stderr,
            }) => Ok(ToolOutput {
                exit_code: Some(code),
                stdout,
                stderr,
                duration: Duration::from_millis(5),
            }),
            Some(Reply::Timeout) => Err(ToolError::Timeout {
                program: cmd.program.clone(),
                after: cmd.timeout,
            }),
            Some(Reply::Missing) | None => Err(ToolError::NotFound {
                program: cmd.program.clone(),
            }),
        }
    }

    async fn connect(&self, host: &str, port: u16, _timeout: Duration) -> ToolResult<()> {
        self.connects.lock().push((host.to_string(), port));
        if self.connect_ok {
            Ok(())
        } else {
            Err(ToolError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        }
    }

    async fn stream(&self, cmd: &ToolCommand) -> ToolResult<Box<dyn MessageStream>> {
        self.calls.lock().push(cmd.clone());
        let Some(script) = self.stream.clone() else {
            return Err(ToolError::NotFound {
                program: cmd.program.clone(),
            });
        };
        Ok(Box::new(ScriptedStream {
            created: Instant::now(),
            pending: script.lines.into_iter().collect(),
            exit_after: script.exit_after,
            terminated: self.stream_terminated.clone(),
        }))
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

/// A temporary directory holding a device configuration header
pub struct DeviceDir {
    _tmp: TempDir,
    pub config: PathBuf,
}

impl DeviceDir {
    pub fn with_config(text: &str) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let config = tmp.path().join("config.h");
        std::fs::write(&config, text).expect("write config.h");
        Self { _tmp: tmp, config }
    }

    pub fn empty() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let config = tmp.path().join("config.h");
        Self { _tmp: tmp, config }
    }
}

/// Settings pointing at `config`, monitoring skipped
pub fn settings_for(config: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.device_config.path = config.to_path_buf();
    settings.monitor.skip = true;
    settings
}

pub async fn run(executor: Arc<ScriptedExecutor>, settings: Settings) -> RunSummary {
    Runner::new(executor, settings, CancellationToken::new())
        .run()
        .await
}
