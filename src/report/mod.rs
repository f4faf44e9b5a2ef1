//! Result collection and the final readiness report
//!
//! - [`ResultSet`] - insertion-ordered outcomes, one per check id
//! - [`ValidationReport`] - pass ratio and tier derived from a `ResultSet`
//! - [`render`] - terminal and JSON output

mod aggregate;
pub mod render;
mod results;

pub use aggregate::{ReportEntry, Tier, ValidationReport, Verdict};
pub use results::ResultSet;
