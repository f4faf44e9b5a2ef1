//! Device Configuration Check
//!
//! Audits the firmware configuration header for production settings.
//! The rule list is fixed; each rule is a substring test over the whole file.
//! The outcome is a `passed/total` ratio. An unreadable file is a hard
//! failure, distinct from a rule not matching.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use super::traits::{Check, CheckContext, CheckError, CheckOutcome, CheckReport, Note, Status};
use crate::client::ToolError;

/// A named content rule
struct Rule {
    name: &'static str,
    description: &'static str,
    matches: fn(&str) -> bool,
}

const RULES: [Rule; 4] = [
    Rule {
        name: "DEBUG false",
        description: "Debug disabled",
        matches: |text| text.contains("DEBUG false"),
    },
    Rule {
        name: "SEARCH_INTERVAL >= 60000",
        description: "mDNS search interval tuned",
        matches: |text| text.contains("60000") || text.contains("SEARCH_INTERVAL"),
    },
    Rule {
        name: "PUBLISH_INTERVAL >= 300000",
        description: "Publish interval tuned",
        matches: |text| text.contains("300000") || text.contains("PUBLISH_INTERVAL"),
    },
    Rule {
        name: "Generic service",
        description: "Generic mDNS service type",
        matches: |text| text.contains("\"mqtt\""),
    },
];

/// Result of one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigCheckResult {
    pub check_name: String,
    pub description: String,
    pub passed: bool,
}

/// Evaluate every rule, in order, against the file contents
pub fn audit(text: &str) -> Vec<ConfigCheckResult> {
    RULES
        .iter()
        .map(|rule| ConfigCheckResult {
            check_name: rule.name.to_string(),
            description: rule.description.to_string(),
            passed: (rule.matches)(text),
        })
        .collect()
}

/// Reduce rule results to a `passed/total` outcome
pub fn audit_outcome(results: &[ConfigCheckResult]) -> CheckOutcome {
    CheckOutcome::RatioMetrics {
        passed: results.iter().filter(|r| r.passed).count(),
        total: results.len(),
    }
}

/// Status line for a configuration file that could not be read
fn unreadable_note(path: &Path, err: &ToolError) -> String {
    match err {
        ToolError::Unreadable { source, .. } if source.kind() == ErrorKind::NotFound => {
            format!("File {} not found", path.display())
        }
        _ => format!("Configuration file unreadable: {err}"),
    }
}

/// Production configuration audit
pub struct DeviceConfigCheck;

#[async_trait]
impl Check for DeviceConfigCheck {
    fn name(&self) -> &'static str {
        "config"
    }

    fn title(&self) -> &'static str {
        "Production configuration"
    }

    fn description(&self) -> &'static str {
        "Audit the firmware configuration header for production values"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<CheckReport, CheckError> {
        let start = Instant::now();
        let path = &ctx.settings.device_config.path;

        info!(path = %path.display(), "Starting configuration check");

        let text = match ctx.executor.read_text(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Configuration file unreadable");
                return Ok(
                    CheckReport::new("config", CheckOutcome::Boolean(false), start.elapsed())
                        .with_note(Status::Fail, unreadable_note(path, &e))
                        .with_detail("error", e.to_string()),
                );
            }
        };

        let results = audit(&text);
        let outcome = audit_outcome(&results);
        let notes = results
            .iter()
            .map(|r| {
                let status = if r.passed { Status::Pass } else { Status::Fail };
                Note::new(status, r.description.clone())
            })
            .collect();

        info!(
            passed = outcome.success(),
            duration_ms = start.elapsed().as_millis(),
            "Configuration check complete"
        );

        Ok(CheckReport::new("config", outcome, start.elapsed())
            .with_notes(notes)
            .with_detail("rules", &results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCTION: &str = r#"
#define DEBUG false
#define MDNS_SERVICE_TYPE "mqtt"
#define SEARCH_INTERVAL 60000
#define PUBLISH_INTERVAL 300000
"#;

    #[test]
    fn test_rule_order_is_fixed() {
        let names: Vec<_> = audit("").into_iter().map(|r| r.check_name).collect();
        assert_eq!(
            names,
            vec![
                "DEBUG false",
                "SEARCH_INTERVAL >= 60000",
                "PUBLISH_INTERVAL >= 300000",
                "Generic service",
            ]
        );
    }

    #[test]
    fn test_all_rules_match() {
        let results = audit(PRODUCTION);
        assert!(results.iter().all(|r| r.passed));
        let outcome = audit_outcome(&results);
        assert_eq!(outcome, CheckOutcome::RatioMetrics { passed: 4, total: 4 });
        assert!(outcome.success());
    }

    #[test]
    fn test_one_rule_missing() {
        let text = PRODUCTION.replace("DEBUG false", "DEBUG true");
        let results = audit(&text);
        assert!(!results[0].passed);
        let outcome = audit_outcome(&results);
        assert_eq!(outcome, CheckOutcome::RatioMetrics { passed: 3, total: 4 });
        assert!(!outcome.success());
    }

    #[test]
    fn test_device_specific_service_fails_generic_rule() {
        let text = PRODUCTION.replace("\"mqtt\"", "\"mosquitto\"");
        let results = audit(&text);
        assert!(!results[3].passed);
        assert!(results[..3].iter().all(|r| r.passed));
    }

    #[test]
    fn test_unreadable_note_distinguishes_missing_file() {
        let path = Path::new("/etc/device/config.h");
        let missing = ToolError::Unreadable {
            path: path.display().to_string(),
            source: std::io::Error::new(ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(unreadable_note(path, &missing), "File /etc/device/config.h not found");

        let denied = ToolError::Unreadable {
            path: path.display().to_string(),
            source: std::io::Error::new(ErrorKind::PermissionDenied, "permission denied"),
        };
        let note = unreadable_note(path, &denied);
        assert!(!note.contains("not found"));
        assert!(note.contains("permission denied"));
    }

    #[test]
    fn test_empty_file_matches_nothing() {
        let outcome = audit_outcome(&audit(""));
        assert_eq!(outcome, CheckOutcome::RatioMetrics { passed: 0, total: 4 });
    }
}
