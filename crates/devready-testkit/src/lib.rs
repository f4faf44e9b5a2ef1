//! devready Test Kit
//!
//! Canned tool output and device configuration text for tests.
//!
//! # Example
//!
//! ```rust
//! use devready_testkit::fixtures::{browse_output, resolved_record};
//!
//! let out = browse_output(&[resolved_record("mosquitto", "pi.local", "192.168.1.20", 1883)]);
//! assert!(out.contains("192.168.1.20"));
//! ```

pub mod fixtures;

pub use fixtures::{DEVELOPMENT_CONFIG, PRODUCTION_CONFIG};
