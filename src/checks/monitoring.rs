//! Monitoring Check
//!
//! Subscribes to the device topic for a bounded time and counts messages.
//!
//! ## What it checks
//!
//! 1. `mosquitto_sub -h <broker> -t <topic> -v` can be started
//! 2. At least one message arrives before the window closes
//! 3. The observed rate (messages per minute) is within the expected band
//!
//! The rate band is advisory only: a low or high rate never turns a
//! passing check into a failure.
//!
//! ## Stopping
//!
//! The poll loop ends on the first of: window elapsed, cancellation,
//! subscription exit. Each iteration checks them in that order and drains
//! buffered lines after sampling the exit state, so a message written just
//! before the subscriber exits is still counted. The subscriber then gets
//! `monitor.shutdown_grace` to exit; an unclean exit is logged, not failed.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::traits::{Check, CheckContext, CheckError, CheckOutcome, CheckReport, Note, Status};
use crate::client::{MessageStream, ToolCommand};
use crate::config::Policy;

/// One received line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessage {
    /// 1-based arrival order
    pub sequence: usize,
    pub timestamp: DateTime<Local>,
    pub raw: String,
}

/// Why the poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Elapsed,
    Cancelled,
    SubscriptionExited,
}

/// Messages collected on one topic
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSession {
    pub topic: String,
    pub duration: Duration,
    messages: Vec<ReceivedMessage>,
}

impl MonitoringSession {
    pub fn new(topic: impl Into<String>, duration: Duration) -> Self {
        Self {
            topic: topic.into(),
            duration,
            messages: Vec::new(),
        }
    }

    /// Append one received line
    pub fn record(&mut self, raw: impl Into<String>) -> &ReceivedMessage {
        let sequence = self.messages.len() + 1;
        self.messages.push(ReceivedMessage {
            sequence,
            timestamp: Local::now(),
            raw: raw.into(),
        });
        &self.messages[sequence - 1]
    }

    pub fn messages(&self) -> &[ReceivedMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Where the observed publish rate falls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateAssessment {
    Low,
    Optimal,
    High,
}

impl RateAssessment {
    /// Classify a rate in messages per minute
    pub fn classify(rate_per_min: f64, policy: &Policy) -> Self {
        if rate_per_min < policy.low_rate_per_min {
            RateAssessment::Low
        } else if rate_per_min > policy.high_rate_per_min {
            RateAssessment::High
        } else {
            RateAssessment::Optimal
        }
    }

    fn note(self) -> Note {
        match self {
            RateAssessment::Low => Note::new(Status::Warn, "Low publish rate"),
            RateAssessment::Optimal => Note::new(Status::Pass, "Optimal publish rate"),
            RateAssessment::High => Note::new(Status::Warn, "High publish rate"),
        }
    }
}

/// Messages per minute; zero when no time elapsed
pub fn rate_per_minute(messages: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        messages as f64 / (secs / 60.0)
    } else {
        0.0
    }
}

/// Summary of a finished monitoring window
#[derive(Debug, Clone)]
pub struct MonitorSummary {
    pub session: MonitoringSession,
    pub elapsed: Duration,
    pub stop: StopReason,
}

impl MonitorSummary {
    pub fn rate_per_min(&self) -> f64 {
        rate_per_minute(self.session.len(), self.elapsed)
    }

    pub fn outcome(&self) -> CheckOutcome {
        CheckOutcome::SuccessMetrics {
            success: !self.session.is_empty(),
            messages_count: self.session.len(),
            duration_secs: self.elapsed.as_secs_f64(),
            rate_per_min: self.rate_per_min(),
        }
    }
}

/// Timing knobs for [`monitor`]
#[derive(Debug, Clone, Copy)]
pub struct MonitorTiming {
    pub duration: Duration,
    pub poll_interval: Duration,
    pub shutdown_grace: Duration,
}

/// Poll a live stream until the window closes, then shut it down
pub async fn monitor(
    stream: &mut dyn MessageStream,
    topic: &str,
    timing: MonitorTiming,
    cancel: &CancellationToken,
) -> MonitorSummary {
    let mut session = MonitoringSession::new(topic, timing.duration);
    let started = Instant::now();

    let stop = loop {
        if started.elapsed() >= timing.duration {
            break StopReason::Elapsed;
        }
        if cancel.is_cancelled() {
            break StopReason::Cancelled;
        }

        let exited = stream.has_exited();
        while let Some(line) = stream.try_next_line() {
            let message = session.record(line);
            info!(
                "[{}] Message {}: {}",
                message.timestamp.format("%H:%M:%S"),
                message.sequence,
                message.raw.trim()
            );
        }
        if exited {
            break StopReason::SubscriptionExited;
        }

        tokio::select! {
            _ = tokio::time::sleep(timing.poll_interval) => {}
            _ = cancel.cancelled() => {}
        }
    };

    if let Err(e) = stream.terminate(timing.shutdown_grace).await {
        warn!(error = %e, "Subscription did not shut down cleanly");
    }

    let elapsed = started.elapsed();
    debug!(
        ?stop,
        messages = session.len(),
        elapsed_ms = elapsed.as_millis(),
        "Monitoring stopped"
    );

    MonitorSummary {
        session,
        elapsed,
        stop,
    }
}

/// Live message monitoring check
pub struct MonitoringCheck;

#[async_trait]
impl Check for MonitoringCheck {
    fn name(&self) -> &'static str {
        "monitoring"
    }

    fn title(&self) -> &'static str {
        "MQTT monitoring"
    }

    fn description(&self) -> &'static str {
        "Count device messages on the topic over a time window"
    }

    fn skip_reason(&self, ctx: &CheckContext) -> Option<String> {
        if ctx.settings.monitor.skip {
            Some("monitoring disabled".to_string())
        } else if ctx.broker().is_none() {
            Some("no MQTT broker to monitor".to_string())
        } else {
            None
        }
    }

    fn watches_cancellation(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &CheckContext) -> Result<CheckReport, CheckError> {
        let settings = &ctx.settings.monitor;
        let Some(broker) = ctx.broker() else {
            return Err(CheckError::MissingResource("MQTT broker address".into()));
        };

        info!(
            broker = %broker,
            topic = %settings.topic,
            duration_secs = settings.duration.as_secs(),
            "Starting monitoring check"
        );

        let cmd = ToolCommand::new("mosquitto_sub", settings.duration)
            .args(["-h", broker, "-t", settings.topic.as_str(), "-v"]);

        let mut stream = match ctx.executor.stream(&cmd).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Subscription could not start");
                let outcome = CheckOutcome::SuccessMetrics {
                    success: false,
                    messages_count: 0,
                    duration_secs: 0.0,
                    rate_per_min: 0.0,
                };
                let text = if e.is_not_found() {
                    e.to_string()
                } else {
                    format!("Monitoring error: {e}")
                };
                return Ok(CheckReport::new("monitoring", outcome, Duration::ZERO)
                    .with_note(Status::Fail, text));
            }
        };

        let timing = MonitorTiming {
            duration: settings.duration,
            poll_interval: settings.poll_interval,
            shutdown_grace: settings.shutdown_grace,
        };
        let summary = monitor(stream.as_mut(), &settings.topic, timing, &ctx.cancel).await;
        let rate = summary.rate_per_min();

        let mut notes = vec![
            Note::new(Status::Info, format!("Topic: {}", settings.topic)),
            Note::new(Status::Info, format!("Messages received: {}", summary.session.len())),
            Note::new(Status::Info, format!("Duration: {:.1}s", summary.elapsed.as_secs_f64())),
            Note::new(Status::Info, format!("Rate: {rate:.2} msg/min")),
        ];
        if summary.stop == StopReason::Cancelled {
            notes.push(Note::new(Status::Warn, "Monitoring interrupted by user"));
        }

        if summary.session.is_empty() {
            notes.push(Note::new(Status::Fail, "No message received from the device"));
        } else {
            notes.push(Note::new(Status::Pass, "Device is publishing"));
            let assessment = RateAssessment::classify(rate, &ctx.settings.policy);
            notes.push(assessment.note());
        }

        info!(
            messages = summary.session.len(),
            rate_per_min = rate,
            stop = ?summary.stop,
            "Monitoring check complete"
        );

        Ok(
            CheckReport::new("monitoring", summary.outcome(), summary.elapsed)
                .with_notes(notes)
                .with_detail("stop_reason", summary.stop)
                .with_detail("messages", summary.session.messages()),
        )
    }
}
