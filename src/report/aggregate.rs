//! Readiness aggregation
//!
//! Boolean and metrics outcomes are scored; ratio outcomes are shown as
//! `passed/total` but stay out of the pass ratio.

use serde::Serialize;

use super::results::ResultSet;
use crate::checks::CheckOutcome;
use crate::config::Policy;

/// How one outcome is shown in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed,
    /// Informational only, not scored
    Ratio { passed: usize, total: usize },
}

impl Verdict {
    /// Classify an outcome
    pub fn of(outcome: &CheckOutcome) -> Self {
        match outcome {
            CheckOutcome::Boolean(true) => Verdict::Passed,
            CheckOutcome::Boolean(false) => Verdict::Failed,
            CheckOutcome::SuccessMetrics { success: true, .. } => Verdict::Passed,
            CheckOutcome::SuccessMetrics { success: false, .. } => Verdict::Failed,
            CheckOutcome::RatioMetrics { passed, total } => Verdict::Ratio {
                passed: *passed,
                total: *total,
            },
        }
    }

    /// Whether this verdict counts toward the pass ratio
    pub fn is_scored(&self) -> bool {
        !matches!(self, Verdict::Ratio { .. })
    }
}

/// Overall readiness bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    FullSuccess,
    PartialSuccess,
    Failed,
}

impl Tier {
    /// Select a tier; `partial_ratio` is the inclusive lower bound of partial success
    pub fn select(pass_ratio: f64, partial_ratio: f64) -> Self {
        if pass_ratio >= 1.0 {
            Tier::FullSuccess
        } else if pass_ratio >= partial_ratio {
            Tier::PartialSuccess
        } else {
            Tier::Failed
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Tier::FullSuccess => "PRODUCTION VALIDATION SUCCEEDED",
            Tier::PartialSuccess => "PRODUCTION VALIDATION PARTIALLY SUCCEEDED",
            Tier::Failed => "PRODUCTION VALIDATION FAILED",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Tier::FullSuccess => "The device is ready for production.",
            Tier::PartialSuccess => "Some adjustments are recommended before going to production.",
            Tier::Failed => "Critical issues must be resolved.",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::FullSuccess => write!(f, "full success"),
            Tier::PartialSuccess => write!(f, "partial success"),
            Tier::Failed => write!(f, "failed"),
        }
    }
}

/// One row of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub check_name: String,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Readiness judgment derived from every recorded outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Scored outcomes
    pub total: usize,
    /// Scored outcomes that passed
    pub passed: usize,
    /// `passed / total`, zero when nothing was scored
    pub pass_ratio: f64,
    pub entries: Vec<ReportEntry>,
    pub tier: Tier,
}

impl ValidationReport {
    /// Aggregate a result set under the given policy
    pub fn from_results(results: &ResultSet, policy: &Policy) -> Self {
        let entries: Vec<ReportEntry> = results
            .iter()
            .map(|(name, outcome)| ReportEntry {
                check_name: name.to_string(),
                verdict: Verdict::of(outcome),
            })
            .collect();

        let total = entries.iter().filter(|e| e.verdict.is_scored()).count();
        let passed = entries
            .iter()
            .filter(|e| e.verdict == Verdict::Passed)
            .count();
        let pass_ratio = if total > 0 {
            passed as f64 / total as f64
        } else {
            0.0
        };

        Self {
            total,
            passed,
            pass_ratio,
            entries,
            tier: Tier::select(pass_ratio, policy.partial_success_ratio),
        }
    }
}
