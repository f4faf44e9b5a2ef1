//! Network Check
//!
//! Pings a fixed list of named targets and records per-target reachability
//! and average round-trip time.
//!
//! ## What it checks
//!
//! 1. The default gateway is detected (`ip route show default`)
//! 2. Every target with an address answers `ping -c <count>`
//! 3. Average latency is parsed from the `min/avg/max/mdev` summary line
//!
//! A target without an address (gateway not detected) is reported but does
//! not take part in the verdict. Latency parsing never affects reachability.
//!
//! ## Options
//!
//! - `network.count`: echo requests per target (default: 3)
//! - `network.timeout`: bound on each ping run (default: 10s)
//! - `network.targets`: named targets, `gateway` for the default route

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::traits::{
    Check, CheckContext, CheckError, CheckOutcome, CheckReport, Note, Stage, Status,
};
use crate::client::{Executor, ToolCommand};

/// A host to probe; `address` is absent when it could not be determined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub name: String,
    pub address: Option<String>,
}

/// Reachability of one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub target_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub reached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

impl ProbeResult {
    /// Whether this result takes part in the verdict
    pub fn counts(&self) -> bool {
        self.address.is_some()
    }
}

/// Network reachability check
pub struct NetworkCheck;

#[async_trait]
impl Check for NetworkCheck {
    fn name(&self) -> &'static str {
        "network"
    }

    fn title(&self) -> &'static str {
        "Network connectivity"
    }

    fn description(&self) -> &'static str {
        "Ping the gateway, a public resolver and an Internet host"
    }

    fn stage(&self) -> Stage {
        Stage::PreResolution
    }

    async fn run(&self, ctx: &CheckContext) -> Result<CheckReport, CheckError> {
        let start = Instant::now();
        let network = &ctx.settings.network;

        let gateway = if network.targets.iter().any(|t| t.is_gateway()) {
            detect_gateway(ctx.executor.as_ref(), network.timeout).await
        } else {
            None
        };

        let targets: Vec<ProbeTarget> = network
            .targets
            .iter()
            .map(|t| ProbeTarget {
                name: t.name.clone(),
                address: if t.is_gateway() {
                    gateway.clone()
                } else {
                    Some(t.address.clone())
                },
            })
            .collect();

        info!(targets = targets.len(), count = network.count, "Starting network check");

        let mut results = Vec::with_capacity(targets.len());
        for target in &targets {
            let result = match &target.address {
                Some(address) => {
                    let (reached, latency_ms) = ping(
                        ctx.executor.as_ref(),
                        address,
                        network.count,
                        network.timeout,
                    )
                    .await;
                    ProbeResult {
                        target_name: target.name.clone(),
                        address: Some(address.clone()),
                        reached,
                        latency_ms,
                    }
                }
                None => ProbeResult {
                    target_name: target.name.clone(),
                    address: None,
                    reached: false,
                    latency_ms: None,
                },
            };
            results.push(result);
        }

        let passed = network_verdict(&results);
        let notes = results.iter().map(probe_note).collect();

        info!(
            passed,
            duration_ms = start.elapsed().as_millis(),
            "Network check complete"
        );

        Ok(
            CheckReport::new("network", CheckOutcome::Boolean(passed), start.elapsed())
                .with_notes(notes)
                .with_detail("probes", &results),
        )
    }
}

/// AND over every target that had an address
pub fn network_verdict(results: &[ProbeResult]) -> bool {
    results.iter().filter(|r| r.counts()).all(|r| r.reached)
}

fn probe_note(result: &ProbeResult) -> Note {
    match &result.address {
        None => Note::new(Status::Warn, format!("{}: not detected", result.target_name)),
        Some(address) => {
            let latency = result
                .latency_ms
                .map(|ms| format!(" ({ms:.1}ms)"))
                .unwrap_or_default();
            let status = if result.reached { Status::Pass } else { Status::Fail };
            Note::new(status, format!("{}: {address}{latency}", result.target_name))
        }
    }
}

/// Ping a host; any tool failure counts as unreachable
async fn ping(
    executor: &dyn Executor,
    host: &str,
    count: u32,
    timeout: Duration,
) -> (bool, Option<f64>) {
    let cmd = ToolCommand::new("ping", timeout)
        .arg("-c")
        .arg(count.to_string())
        .arg(host);

    match executor.run(&cmd).await {
        Ok(output) if output.success() => {
            let latency = parse_average_latency(&output.stdout);
            if latency.is_none() {
                debug!(host = %host, "No latency summary in ping output");
            }
            (true, latency)
        }
        Ok(output) => {
            debug!(host = %host, exit_code = ?output.exit_code, "Ping failed");
            (false, None)
        }
        Err(e) => {
            warn!(host = %host, error = %e, "Ping could not run");
            (false, None)
        }
    }
}

/// Extract the average from a `min/avg/max/mdev = a/b/c/d ms` summary line
pub fn parse_average_latency(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .filter(|line| line.contains("avg") || line.contains("mdev"))
        .find_map(|line| {
            let (_, values) = line.split_once('=')?;
            values.trim().split('/').nth(1)?.trim().parse::<f64>().ok()
        })
}

/// Find the default gateway; failures mean "not detected"
async fn detect_gateway(executor: &dyn Executor, timeout: Duration) -> Option<String> {
    let cmd = ToolCommand::new("ip", timeout).args(["route", "show", "default"]);
    match executor.run(&cmd).await {
        Ok(output) => parse_default_gateway(&output.stdout),
        Err(e) => {
            debug!(error = %e, "Gateway detection failed");
            None
        }
    }
}

/// Extract the gateway from a `default via <ip> ...` route line
pub fn parse_default_gateway(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .filter(|line| line.contains("default via"))
        .find_map(|line| line.split_whitespace().nth(2).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, address: Option<&str>, reached: bool) -> ProbeResult {
        ProbeResult {
            target_name: name.to_string(),
            address: address.map(str::to_string),
            reached,
            latency_ms: None,
        }
    }

    #[test]
    fn test_check_metadata() {
        let check = NetworkCheck;
        assert_eq!(check.name(), "network");
        assert!(!check.description().is_empty());
        assert_eq!(check.stage(), Stage::PreResolution);
    }

    #[test]
    fn test_parse_linux_summary() {
        let out = "3 packets transmitted, 3 received, 0% packet loss, time 2003ms\n\
                   rtt min/avg/max/mdev = 11.203/12.450/13.901/1.103 ms\n";
        assert_eq!(parse_average_latency(out), Some(12.45));
    }

    #[test]
    fn test_parse_bsd_summary() {
        let out = "round-trip min/avg/max/stddev = 1.1/2.25/3.3/0.4 ms\n";
        assert_eq!(parse_average_latency(out), Some(2.25));
    }

    #[test]
    fn test_unparsable_summary_is_absent() {
        assert_eq!(parse_average_latency("rtt min/avg/max/mdev = garbage"), None);
        assert_eq!(parse_average_latency("no summary here"), None);
        assert_eq!(parse_average_latency(""), None);
    }

    #[test]
    fn test_parse_default_gateway() {
        let out = "default via 192.168.1.1 dev wlan0 proto dhcp metric 600\n";
        assert_eq!(parse_default_gateway(out).as_deref(), Some("192.168.1.1"));
        assert_eq!(parse_default_gateway(""), None);
        assert_eq!(parse_default_gateway("10.0.0.0/8 dev eth0"), None);
    }

    #[test]
    fn test_verdict_ignores_undetected_targets() {
        let results = vec![
            result("gateway", None, false),
            result("dns", Some("8.8.8.8"), true),
            result("internet", Some("google.com"), true),
        ];
        assert!(network_verdict(&results));
    }

    #[test]
    fn test_verdict_fails_on_any_unreachable() {
        let results = vec![
            result("dns", Some("8.8.8.8"), true),
            result("internet", Some("google.com"), false),
        ];
        assert!(!network_verdict(&results));
    }

    #[test]
    fn test_verdict_with_no_addressed_targets() {
        assert!(network_verdict(&[result("gateway", None, false)]));
        assert!(network_verdict(&[]));
    }

    #[test]
    fn test_probe_notes() {
        let note = probe_note(&result("gateway", None, false));
        assert_eq!(note.status, Status::Warn);
        assert_eq!(note.text, "gateway: not detected");

        let mut reached = result("dns", Some("8.8.8.8"), true);
        reached.latency_ms = Some(12.345);
        let note = probe_note(&reached);
        assert_eq!(note.status, Status::Pass);
        assert_eq!(note.text, "dns: 8.8.8.8 (12.3ms)");
    }
}
