//! Check implementations for production validation
//!
//! This module provides the `Check` trait and the fixed battery of checks
//! run against a deployed device and its broker.
//!
//! ## Check Stages
//!
//! - **Pre-resolution**: network, discovery
//! - **Post-resolution** (broker address known): broker, config, monitoring
//!
//! ## Adding New Checks
//!
//! 1. Create a new file in `src/checks/` (e.g., `mycheck.rs`)
//! 2. Implement the `Check` trait
//! 3. Register in `registry.rs`
//! 4. Add to `mod.rs` exports

mod broker;
mod device_config;
mod discovery;
pub mod monitoring;
mod network;
pub mod registry;
mod traits;

pub use broker::BrokerCheck;
pub use device_config::{ConfigCheckResult, DeviceConfigCheck, audit, audit_outcome};
pub use discovery::{DiscoveredService, DiscoveryCheck, SERVICES_DETAIL, parse_services};
pub use monitoring::{MonitoringCheck, MonitoringSession, RateAssessment, rate_per_minute};
pub use network::{
    NetworkCheck, ProbeResult, ProbeTarget, network_verdict, parse_average_latency,
    parse_default_gateway,
};
pub use registry::CHECKS;
pub use traits::*;
