//! devready - production-readiness validation for MQTT devices
//!
//! Runs one bounded validation pass against a device that advertises its
//! broker over mDNS and publishes over MQTT, then prints a tiered verdict.
//!
//! ## Modules
//!
//! - [`client`] - Executor seam over ping, avahi-browse, mosquitto and files
//! - [`checks`] - The fixed check battery and its registry
//! - [`config`] - Settings file, CLI overrides, broker resolution
//! - [`report`] - Outcome collection, tiering and rendering
//! - [`runner`] - Sequential orchestration of one pass

pub mod checks;
pub mod client;
pub mod config;
pub mod report;
pub mod runner;

pub use runner::{RunSummary, Runner};
