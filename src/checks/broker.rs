//! Broker Check
//!
//! Verifies the resolved broker accepts TCP connections on the MQTT port,
//! then publishes one diagnostic message at QoS 0 with `mosquitto_pub`.
//!
//! - No broker address: fail without connecting
//! - Connection refused or timed out: fail
//! - Publish tool missing: pass on the strength of the TCP check
//! - Publish rejected or timed out: fail

use async_trait::async_trait;
use std::time::Instant;
use tracing::{info, warn};

use super::traits::{Check, CheckContext, CheckError, CheckOutcome, CheckReport, Status};
use crate::client::{ToolCommand, ToolError};

/// Broker reachability check
pub struct BrokerCheck;

#[async_trait]
impl Check for BrokerCheck {
    fn name(&self) -> &'static str {
        "broker"
    }

    fn title(&self) -> &'static str {
        "MQTT connectivity"
    }

    fn description(&self) -> &'static str {
        "Connect to the broker port and publish a test message"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<CheckReport, CheckError> {
        let start = Instant::now();
        let settings = &ctx.settings.broker;

        let Some(broker) = ctx.broker() else {
            warn!("No broker address known, skipping connection");
            return Ok(
                CheckReport::new("broker", CheckOutcome::Boolean(false), start.elapsed())
                    .with_note(Status::Warn, "No MQTT broker specified"),
            );
        };

        info!(broker = %broker, port = settings.port, "Starting broker check");

        if let Err(e) = ctx
            .executor
            .connect(broker, settings.port, settings.connect_timeout)
            .await
        {
            warn!(broker = %broker, error = %e, "Broker connection failed");
            return Ok(
                CheckReport::new("broker", CheckOutcome::Boolean(false), start.elapsed())
                    .with_note(Status::Fail, format!("MQTT connection error: {e}")),
            );
        }

        let mut report = CheckReport::new("broker", CheckOutcome::Boolean(false), start.elapsed())
            .with_note(
                Status::Pass,
                format!("TCP connection to broker {broker}:{}", settings.port),
            );

        let payload = format!(
            "Test validation {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let cmd = ToolCommand::new("mosquitto_pub", settings.publish_timeout).args([
            "-h",
            broker,
            "-t",
            settings.publish_topic.as_str(),
            "-m",
            payload.as_str(),
            "-q",
            "0",
        ]);

        let passed = match ctx.executor.run(&cmd).await {
            Ok(output) if output.success() => {
                report = report.with_note(Status::Pass, "MQTT test publish succeeded");
                true
            }
            Ok(output) => {
                report = report.with_note(
                    Status::Warn,
                    format!("MQTT test publish failed: {}", output.stderr.trim()),
                );
                false
            }
            Err(ToolError::NotFound { program }) => {
                report = report.with_note(
                    Status::Warn,
                    format!("{program} not available, TCP check only"),
                );
                true
            }
            Err(e) => {
                report = report.with_note(Status::Fail, format!("MQTT test publish error: {e}"));
                false
            }
        };

        info!(
            passed,
            duration_ms = start.elapsed().as_millis(),
            "Broker check complete"
        );

        report.outcome = CheckOutcome::Boolean(passed);
        report.duration = start.elapsed();
        Ok(report.with_detail("broker", broker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::Stage;

    #[test]
    fn test_check_metadata() {
        let check = BrokerCheck;
        assert_eq!(check.name(), "broker");
        assert_eq!(check.stage(), Stage::PostResolution);
    }
}
