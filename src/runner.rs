//! Validation runner
//!
//! Executes the registry's checks strictly in sequence: the pre-resolution
//! stage, one broker resolution, then the post-resolution stage. Each check
//! records at most one outcome; a check that errors is recorded as failed
//! and the run continues.
//!
//! Cancellation stops the run between checks. A check that does not watch
//! the token itself is raced against it and dropped (killing any child it
//! spawned); the monitoring check watches it and returns partial results.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::checks::registry::checks_in_stage;
use crate::checks::{
    Check, CheckContext, CheckOutcome, CheckReport, DiscoveredService, SERVICES_DETAIL, Stage,
};
use crate::client::Executor;
use crate::config::{ResolvedConfig, Settings};
use crate::report::{ResultSet, Tier, ValidationReport, render};

/// Process exit status when the run was stopped by SIGINT or SIGTERM
pub const EXIT_INTERRUPTED: u8 = 130;

/// Process exit status when the tier is not full success
pub const EXIT_NOT_READY: u8 = 1;

/// Everything a finished (or interrupted) run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
    pub resolved: ResolvedConfig,
    pub results: ResultSet,
    pub checks: Vec<CheckReport>,
    pub report: ValidationReport,
    pub interrupted: bool,
}

impl RunSummary {
    /// Process exit status for this run
    ///
    /// An interrupted run exits with [`EXIT_INTERRUPTED`] whatever its tier.
    pub fn exit_status(&self) -> u8 {
        if self.interrupted {
            return EXIT_INTERRUPTED;
        }
        match self.report.tier {
            Tier::FullSuccess => 0,
            Tier::PartialSuccess | Tier::Failed => EXIT_NOT_READY,
        }
    }
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Runs one validation pass
pub struct Runner {
    executor: Arc<dyn Executor>,
    settings: Arc<Settings>,
    cancel: CancellationToken,
    echo: bool,
}

impl Runner {
    pub fn new(executor: Arc<dyn Executor>, settings: Settings, cancel: CancellationToken) -> Self {
        Self {
            executor,
            settings: Arc::new(settings),
            cancel,
            echo: false,
        }
    }

    /// Print headings and status lines to stdout as checks complete
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    fn print(&self, text: impl AsRef<str>) {
        if self.echo {
            println!("{}", text.as_ref());
        }
    }

    /// Run every check and aggregate the outcomes
    pub async fn run(&self) -> RunSummary {
        let started_at = Local::now();
        let start = Instant::now();
        self.print(render::header(started_at));

        let mut results = ResultSet::new();
        let mut checks = Vec::new();

        let ctx = CheckContext::new(
            self.executor.clone(),
            self.settings.clone(),
            self.cancel.clone(),
        );

        for check in checks_in_stage(Stage::PreResolution) {
            if self.cancel.is_cancelled() {
                break;
            }
            self.execute(check.as_ref(), &ctx, &mut results, &mut checks)
                .await;
        }

        let discovered: Vec<DiscoveredService> = checks
            .iter()
            .filter_map(|r| r.detail::<Vec<DiscoveredService>>(SERVICES_DETAIL))
            .flatten()
            .collect();
        let resolved = ResolvedConfig::resolve(&self.settings, &discovered);
        info!(broker = ?resolved.broker, source = %resolved.source, "Broker resolved");
        let ctx = ctx.with_resolved(resolved.clone());

        for check in checks_in_stage(Stage::PostResolution) {
            if self.cancel.is_cancelled() {
                break;
            }
            self.execute(check.as_ref(), &ctx, &mut results, &mut checks)
                .await;
        }

        let interrupted = self.cancel.is_cancelled();
        if interrupted {
            warn!("Validation interrupted, reporting partial results");
        }

        let report = ValidationReport::from_results(&results, &self.settings.policy);
        let elapsed = start.elapsed();
        let finished_at = Local::now();
        self.print(render::summary(&report, elapsed, finished_at));

        info!(
            tier = %report.tier,
            passed = report.passed,
            total = report.total,
            duration_ms = elapsed.as_millis(),
            "Validation complete"
        );

        RunSummary {
            started_at,
            finished_at,
            elapsed,
            resolved,
            results,
            checks,
            report,
            interrupted,
        }
    }

    async fn execute(
        &self,
        check: &dyn Check,
        ctx: &CheckContext,
        results: &mut ResultSet,
        checks: &mut Vec<CheckReport>,
    ) {
        let name = check.name();

        if let Some(reason) = check.skip_reason(ctx) {
            info!(check = %name, reason = %reason, "Check skipped");
            self.print(render::skipped_line(check.title(), &reason));
            return;
        }

        self.print(render::check_heading(check.title()));
        info!(check = %name, "Starting check");

        let result = if check.watches_cancellation() {
            check.run(ctx).await
        } else {
            tokio::select! {
                result = check.run(ctx) => result,
                _ = self.cancel.cancelled() => {
                    warn!(check = %name, "Check interrupted");
                    return;
                }
            }
        };

        match result {
            Ok(report) => {
                for note in &report.notes {
                    self.print(render::note_line(note));
                }
                if report.passed() {
                    info!(check = %name, duration_ms = report.duration.as_millis(), "Check PASSED");
                } else {
                    warn!(check = %name, duration_ms = report.duration.as_millis(), "Check FAILED");
                }
                results.record(name, report.outcome.clone());
                checks.push(report);
            }
            Err(e) => {
                error!(check = %name, error = %e, "Check error");
                self.print(render::error_line(check.title(), &e.to_string()));
                results.record(name, CheckOutcome::Boolean(false));
            }
        }
    }
}
