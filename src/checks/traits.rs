//! Check trait and supporting types
//!
//! The `Check` trait defines the interface for all validation checks.
//! Each check reads a `CheckContext` and returns a `CheckReport` whose
//! `CheckOutcome` is what the aggregator scores.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::client::Executor;
use crate::config::{ResolvedConfig, Settings};

/// Errors that can occur during check execution
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Missing resource: {0}")]
    MissingResource(String),
}

/// What a check observed, reduced to something the aggregator can score
///
/// Serializes untagged: a bare boolean, a metrics record, or a ratio record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CheckOutcome {
    /// Plain pass/fail
    Boolean(bool),

    /// Pass/fail plus measurements
    SuccessMetrics {
        success: bool,
        messages_count: usize,
        #[serde(rename = "duration")]
        duration_secs: f64,
        rate_per_min: f64,
    },

    /// Count of satisfied items out of a fixed total
    RatioMetrics { passed: usize, total: usize },
}

impl CheckOutcome {
    /// Component-level success; a ratio succeeds only when complete
    pub fn success(&self) -> bool {
        match self {
            CheckOutcome::Boolean(passed) => *passed,
            CheckOutcome::SuccessMetrics { success, .. } => *success,
            CheckOutcome::RatioMetrics { passed, total } => passed == total,
        }
    }
}

/// Severity of a status line shown under a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Warn,
    Info,
}

/// A one-line status message produced by a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub status: Status,
    pub text: String,
}

impl Note {
    pub fn new(status: Status, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }
}

/// Result of running one check
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Identifier the outcome is recorded under
    pub check_name: String,
    pub outcome: CheckOutcome,
    /// How long the check took
    pub duration: Duration,
    /// Status lines in the order they were produced
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    /// Additional details (check-specific)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, serde_json::Value>,
}

impl CheckReport {
    /// Create a report with no notes
    pub fn new(check_name: impl Into<String>, outcome: CheckOutcome, duration: Duration) -> Self {
        Self {
            check_name: check_name.into(),
            outcome,
            duration,
            notes: Vec::new(),
            details: HashMap::new(),
        }
    }

    /// Whether the check passed at component level
    pub fn passed(&self) -> bool {
        self.outcome.success()
    }

    /// Replace the notes
    pub fn with_notes(mut self, notes: Vec<Note>) -> Self {
        self.notes = notes;
        self
    }

    /// Append a note
    pub fn with_note(mut self, status: Status, text: impl Into<String>) -> Self {
        self.notes.push(Note::new(status, text));
        self
    }

    /// Add a detail to the report
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.insert(key.into(), v);
        }
        self
    }

    /// Get a detail as a specific type
    pub fn detail<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.details
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// When a check runs relative to broker resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Runs before the broker address is resolved
    PreResolution,
    /// Runs with the resolved broker address
    PostResolution,
}

/// Context provided to checks during execution
#[derive(Clone)]
pub struct CheckContext {
    pub executor: Arc<dyn Executor>,
    pub settings: Arc<Settings>,
    pub resolved: ResolvedConfig,
    /// Fired when the operator asks the run to stop
    pub cancel: CancellationToken,
}

impl CheckContext {
    /// Create a context holding only the supplied broker, if any
    pub fn new(
        executor: Arc<dyn Executor>,
        settings: Arc<Settings>,
        cancel: CancellationToken,
    ) -> Self {
        let resolved = ResolvedConfig::supplied(&settings);
        Self {
            executor,
            settings,
            resolved,
            cancel,
        }
    }

    /// Context for the post-resolution stage
    pub fn with_resolved(mut self, resolved: ResolvedConfig) -> Self {
        self.resolved = resolved;
        self
    }

    /// The broker address, once known
    pub fn broker(&self) -> Option<&str> {
        self.resolved.broker.as_deref()
    }
}

/// Trait for implementing validation checks
///
/// Checks absorb their own faults: tool failures, timeouts and bad output
/// become a failing outcome with explanatory notes. An `Err` is reserved
/// for faults the check cannot describe itself.
#[async_trait]
pub trait Check: Send + Sync {
    /// Identifier used for the recorded outcome and on the CLI
    fn name(&self) -> &'static str;

    /// Heading printed before the check runs
    fn title(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Stage the check belongs to
    fn stage(&self) -> Stage {
        Stage::PostResolution
    }

    /// Reason to leave this check out of the run, if any
    ///
    /// A skipped check records no outcome.
    fn skip_reason(&self, _ctx: &CheckContext) -> Option<String> {
        None
    }

    /// Whether `run` observes `ctx.cancel` and returns partial results
    ///
    /// Checks that do not are dropped by the runner on cancellation.
    fn watches_cancellation(&self) -> bool {
        false
    }

    /// Run the check
    async fn run(&self, ctx: &CheckContext) -> Result<CheckReport, CheckError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        assert!(CheckOutcome::Boolean(true).success());
        assert!(!CheckOutcome::Boolean(false).success());
        assert!(
            CheckOutcome::SuccessMetrics {
                success: true,
                messages_count: 1,
                duration_secs: 60.0,
                rate_per_min: 1.0
            }
            .success()
        );
        assert!(CheckOutcome::RatioMetrics { passed: 4, total: 4 }.success());
        assert!(!CheckOutcome::RatioMetrics { passed: 3, total: 4 }.success());
    }

    #[test]
    fn test_outcome_serializes_untagged() {
        let json = serde_json::to_value(CheckOutcome::Boolean(true)).unwrap();
        assert_eq!(json, serde_json::json!(true));

        let json =
            serde_json::to_value(CheckOutcome::RatioMetrics { passed: 3, total: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({"passed": 3, "total": 4}));

        let json = serde_json::to_value(CheckOutcome::SuccessMetrics {
            success: true,
            messages_count: 5,
            duration_secs: 60.0,
            rate_per_min: 5.0,
        })
        .unwrap();
        assert_eq!(json["duration"], serde_json::json!(60.0));
        assert_eq!(json["messages_count"], serde_json::json!(5));
    }

    #[test]
    fn test_report_details_roundtrip() {
        let report = CheckReport::new("discovery", CheckOutcome::Boolean(true), Duration::ZERO)
            .with_detail("count", 2usize)
            .with_note(Status::Pass, "found");
        assert_eq!(report.detail::<usize>("count"), Some(2));
        assert_eq!(report.detail::<String>("missing"), None);
        assert_eq!(report.notes.len(), 1);
        assert!(report.passed());
    }
}
