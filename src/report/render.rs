//! Terminal rendering
//!
//! Builds the text printed to stdout. Colors come from `colored`, which
//! honours `NO_COLOR` and `CLICOLOR`.

use chrono::{DateTime, Local};
use colored::Colorize;
use std::fmt::Write;
use std::time::Duration;

use super::aggregate::{Tier, ValidationReport, Verdict};
use crate::checks::{Note, Status};

const RULE_WIDTH: usize = 60;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn title_case(check_name: &str) -> String {
    check_name
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn status_mark(status: Status) -> String {
    match status {
        Status::Pass => "✅".green().to_string(),
        Status::Fail => "❌".red().to_string(),
        Status::Warn => "⚠️".yellow().to_string(),
        Status::Info => "-".cyan().to_string(),
    }
}

/// Banner printed before the first check
pub fn header(started: DateTime<Local>) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule.blue().bold());
    let _ = writeln!(out, "{}", "  PRODUCTION VALIDATION - mDNS MQTT device".blue().bold());
    let _ = writeln!(out, "{}", rule.blue().bold());
    let _ = writeln!(out, "Started: {}", started.format(TIMESTAMP_FORMAT));
    out
}

/// Heading printed before a check runs
pub fn check_heading(title: &str) -> String {
    format!("\n{}", format!("🧪 {title}...").magenta())
}

/// One indented status line
pub fn note_line(note: &Note) -> String {
    format!("  {} {}", status_mark(note.status), note.text)
}

/// Line printed when a check is left out
pub fn skipped_line(title: &str, reason: &str) -> String {
    format!("  {} {title} skipped: {reason}", status_mark(Status::Warn))
}

/// Line printed when a check raised an error the runner had to catch
pub fn error_line(title: &str, error: &str) -> String {
    format!("{}", format!("❌ Error in {title}: {error}").red())
}

fn tier_banner(tier: Tier) -> String {
    let text = match tier {
        Tier::FullSuccess => format!("🎉 {}!", tier.headline()).green(),
        Tier::PartialSuccess => format!("⚠️ {}", tier.headline()).yellow(),
        Tier::Failed => format!("❌ {}", tier.headline()).red(),
    };
    text.bold().to_string()
}

/// Final summary: totals, per-check verdicts and the tier
pub fn summary(report: &ValidationReport, elapsed: Duration, finished: DateTime<Local>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", "📋 PRODUCTION VALIDATION REPORT".blue().bold());
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out, "Total time: {:.1}s", elapsed.as_secs_f64());
    let _ = writeln!(out, "Timestamp: {}", finished.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out);
    let _ = writeln!(out, "Checks run: {}", report.total);
    let _ = writeln!(out, "Checks passed: {}", report.passed);
    let _ = writeln!(out, "Success rate: {:.1}%", report.pass_ratio * 100.0);
    let _ = writeln!(out);

    for entry in &report.entries {
        let name = title_case(&entry.check_name);
        let _ = match entry.verdict {
            Verdict::Passed => writeln!(out, "{} {name}", status_mark(Status::Pass)),
            Verdict::Failed => writeln!(out, "{} {name}", status_mark(Status::Fail)),
            Verdict::Ratio { passed, total } => writeln!(out, "📊 {name}: {passed}/{total}"),
        };
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", tier_banner(report.tier));
    let _ = writeln!(out, "{}", report.tier.recommendation());
    let _ = writeln!(out);
    let _ = writeln!(out, "See TROUBLESHOOTING.md for more information.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckOutcome;
    use crate::config::Policy;
    use crate::report::ResultSet;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("network"), "Network");
        assert_eq!(title_case("mqtt_monitoring"), "Mqtt Monitoring");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_note_line_contains_text() {
        let line = note_line(&Note::new(Status::Warn, "Low publish rate"));
        assert!(line.contains("Low publish rate"));
        assert!(line.starts_with("  "));
    }

    #[test]
    fn test_summary_lists_every_check() {
        colored::control::set_override(false);
        let results: ResultSet = [
            ("network", CheckOutcome::Boolean(true)),
            ("broker", CheckOutcome::Boolean(false)),
            ("config", CheckOutcome::RatioMetrics { passed: 3, total: 4 }),
        ]
        .into_iter()
        .collect();
        let report = ValidationReport::from_results(&results, &Policy::default());

        let text = summary(&report, Duration::from_secs(12), Local::now());

        assert!(text.contains("Total time: 12.0s"));
        assert!(text.contains("Checks run: 2"));
        assert!(text.contains("Checks passed: 1"));
        assert!(text.contains("Success rate: 50.0%"));
        assert!(text.contains("✅ Network"));
        assert!(text.contains("❌ Broker"));
        assert!(text.contains("📊 Config: 3/4"));
        assert!(text.contains(Tier::Failed.headline()));
        assert!(text.contains(Tier::Failed.recommendation()));
    }
}
