//! Configuration parsing
//!
//! Handles the validator settings file, command-line overrides and the
//! one-time broker resolution step.
//!
//! ## Configuration Format
//!
//! ```yaml
//! broker:
//!   address: 192.168.1.20   # omit to use the first discovered broker
//!   port: 1883
//!   connect_timeout: 5s
//!
//! discovery:
//!   service_type: _mqtt._tcp
//!   timeout: 10s
//!
//! network:
//!   count: 3
//!   timeout: 10s
//!   targets:
//!     - name: Local gateway
//!       address: gateway
//!     - name: Google DNS
//!       address: 8.8.8.8
//!
//! monitor:
//!   topic: /arduino
//!   duration: 5m
//!
//! device_config:
//!   path: config.h
//!
//! policy:
//!   low_rate_per_min: 0.1
//!   high_rate_per_min: 2.0
//!   partial_success_ratio: 0.8
//! ```

mod resolve;
mod settings;

pub use resolve::{BrokerSource, ResolvedConfig};
pub use settings::{
    BrokerSettings, ConfigError, DeviceConfigSettings, DiscoverySettings, GATEWAY_ALIAS,
    MonitorSettings, NetworkSettings, Overrides, Policy, Settings, TargetConfig,
};
