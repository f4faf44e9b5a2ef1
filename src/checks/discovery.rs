//! Discovery Check
//!
//! Browses the local network for advertised broker services.
//!
//! Runs `avahi-browse -t <service_type> --resolve --parsable` once and keeps
//! every resolved IPv4 record (`=;iface;IPv4;name;type;domain;host;addr;port;txt`).
//! The discovered services are attached to the report under the
//! `services` detail so the runner can resolve the broker from them.
//!
//! Missing tool, timeout and other failures each fail the check with their
//! own message; none of them abort the run.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::traits::{
    Check, CheckContext, CheckError, CheckOutcome, CheckReport, Note, Stage, Status,
};
use crate::client::{ToolCommand, ToolError};

/// Report detail key holding the discovered services
pub const SERVICES_DETAIL: &str = "services";

const RECORD_MARKER: char = '=';

/// A resolved service advertisement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredService {
    pub name: String,
    pub hostname: String,
    pub address: String,
    pub port: u16,
}

/// Broker service discovery check
pub struct DiscoveryCheck;

#[async_trait]
impl Check for DiscoveryCheck {
    fn name(&self) -> &'static str {
        "discovery"
    }

    fn title(&self) -> &'static str {
        "Service discovery"
    }

    fn description(&self) -> &'static str {
        "Find advertised MQTT brokers on the local network"
    }

    fn stage(&self) -> Stage {
        Stage::PreResolution
    }

    async fn run(&self, ctx: &CheckContext) -> Result<CheckReport, CheckError> {
        let start = Instant::now();
        let discovery = &ctx.settings.discovery;

        info!(service_type = %discovery.service_type, "Starting discovery check");

        let cmd = ToolCommand::new("avahi-browse", discovery.timeout).args([
            "-t",
            discovery.service_type.as_str(),
            "--resolve",
            "--parsable",
        ]);

        let (services, notes) = match ctx.executor.run(&cmd).await {
            Ok(output) if output.success() && !output.stdout.trim().is_empty() => {
                let services = parse_services(&output.stdout);
                let notes = if services.is_empty() {
                    vec![Note::new(Status::Warn, "No MQTT service found via mDNS")]
                } else {
                    let mut notes = vec![Note::new(Status::Pass, "MQTT services detected:")];
                    notes.extend(services.iter().map(|s| {
                        Note::new(Status::Info, format!("{} @ {}:{}", s.name, s.address, s.port))
                    }));
                    notes
                };
                (services, notes)
            }
            Ok(output) => {
                debug!(
                    exit_code = ?output.exit_code,
                    stderr = %output.stderr.trim(),
                    "Browse returned nothing"
                );
                (
                    Vec::new(),
                    vec![Note::new(Status::Fail, "avahi-browse error or no service")],
                )
            }
            Err(ToolError::NotFound { program }) => {
                warn!(program = %program, "Discovery tool missing");
                (
                    Vec::new(),
                    vec![Note::new(Status::Warn, format!("{program} not available"))],
                )
            }
            Err(ToolError::Timeout { after, .. }) => {
                warn!(timeout_ms = after.as_millis(), "Discovery timed out");
                (
                    Vec::new(),
                    vec![Note::new(Status::Fail, "Timeout while browsing for MQTT services")],
                )
            }
            Err(e) => {
                warn!(error = %e, "Discovery failed");
                (Vec::new(), vec![Note::new(Status::Fail, format!("Error: {e}"))])
            }
        };

        let passed = !services.is_empty();
        info!(
            passed,
            services = services.len(),
            duration_ms = start.elapsed().as_millis(),
            "Discovery check complete"
        );

        Ok(
            CheckReport::new("discovery", CheckOutcome::Boolean(passed), start.elapsed())
                .with_notes(notes)
                .with_detail(SERVICES_DETAIL, &services),
        )
    }
}

/// Parse resolved IPv4 records from `avahi-browse --parsable` output
///
/// Lines that are not resolved records, are not IPv4, or have too few
/// fields or a bad port are skipped.
pub fn parse_services(stdout: &str) -> Vec<DiscoveredService> {
    stdout
        .lines()
        .filter(|line| line.starts_with(RECORD_MARKER) && line.contains("IPv4"))
        .filter_map(parse_record)
        .collect()
}

fn parse_record(line: &str) -> Option<DiscoveredService> {
    let fields: Vec<&str> = line.split(';').collect();
    if fields.len() < 9 {
        debug!(line = %line, "Short discovery record");
        return None;
    }
    let port = fields[8].trim().parse().ok()?;
    Some(DiscoveredService {
        name: fields[3].to_string(),
        hostname: fields[6].to_string(),
        address: fields[7].to_string(),
        port,
    })
}
