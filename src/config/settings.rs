//! Validator settings
//!
//! Every field has a default, so an empty or missing settings file yields
//! the standard validation pass.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Target address that is replaced by the detected default gateway
pub const GATEWAY_ALIAS: &str = "gateway";

/// Standard MQTT port
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Publish rate below which the device is considered too quiet (messages/min)
pub const DEFAULT_LOW_RATE_PER_MIN: f64 = 0.1;

/// Publish rate above which the device is considered too chatty (messages/min)
pub const DEFAULT_HIGH_RATE_PER_MIN: f64 = 2.0;

/// Pass ratio at or above which a run is a partial success
pub const DEFAULT_PARTIAL_SUCCESS_RATIO: f64 = 0.8;

/// Errors that can occur during configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Broker connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    /// Broker address; when absent the first discovered broker is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub port: u16,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Topic used for the diagnostic publish
    pub publish_topic: String,
    #[serde(with = "humantime_serde")]
    pub publish_timeout: Duration,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            address: None,
            port: DEFAULT_BROKER_PORT,
            connect_timeout: Duration::from_secs(5),
            publish_topic: "/test/validation".to_string(),
            publish_timeout: Duration::from_secs(10),
        }
    }
}

/// Service discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    pub service_type: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            service_type: "_mqtt._tcp".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// A named reachability target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    /// Host name or IP, or [`GATEWAY_ALIAS`] for the default gateway
    pub address: String,
}

impl TargetConfig {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Whether this target stands for the detected default gateway
    pub fn is_gateway(&self) -> bool {
        self.address == GATEWAY_ALIAS
    }
}

/// Network reachability settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Echo requests per target
    pub count: u32,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub targets: Vec<TargetConfig>,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            count: 3,
            timeout: Duration::from_secs(10),
            targets: vec![
                TargetConfig::new("Local gateway", GATEWAY_ALIAS),
                TargetConfig::new("Google DNS", "8.8.8.8"),
                TargetConfig::new("Internet", "google.com"),
            ],
        }
    }
}

/// Live message monitoring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub topic: String,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// Skip monitoring entirely
    pub skip: bool,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// How long the subscription gets to exit once stopped
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            topic: "/arduino".to_string(),
            duration: Duration::from_secs(300),
            skip: false,
            poll_interval: Duration::from_millis(100),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Device configuration audit settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfigSettings {
    pub path: PathBuf,
}

impl Default for DeviceConfigSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config.h"),
        }
    }
}

/// Decision thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub low_rate_per_min: f64,
    pub high_rate_per_min: f64,
    pub partial_success_ratio: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            low_rate_per_min: DEFAULT_LOW_RATE_PER_MIN,
            high_rate_per_min: DEFAULT_HIGH_RATE_PER_MIN,
            partial_success_ratio: DEFAULT_PARTIAL_SUCCESS_RATIO,
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub discovery: DiscoverySettings,
    pub network: NetworkSettings,
    pub monitor: MonitorSettings,
    pub device_config: DeviceConfigSettings,
    pub policy: Policy,
}

/// Command-line values that take precedence over the settings file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub broker: Option<String>,
    pub topic: Option<String>,
    pub monitor_secs: Option<u64>,
    pub no_monitor: bool,
    pub device_config: Option<PathBuf>,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load settings from a YAML file, falling back to defaults if it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse and validate settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty mapping.
        let settings: Settings = if yaml.trim().is_empty() {
            Settings::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Apply command-line overrides
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(broker) = overrides.broker {
            self.broker.address = Some(broker);
        }
        if let Some(topic) = overrides.topic {
            self.monitor.topic = topic;
        }
        if let Some(secs) = overrides.monitor_secs {
            self.monitor.duration = Duration::from_secs(secs);
        }
        if overrides.no_monitor {
            self.monitor.skip = true;
        }
        if let Some(path) = overrides.device_config {
            self.device_config.path = path;
        }
    }

    /// Reject values no validation pass can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.count == 0 {
            return Err(ConfigError::Invalid("network.count must be at least 1".into()));
        }
        if self.monitor.topic.is_empty() {
            return Err(ConfigError::Invalid("monitor.topic must not be empty".into()));
        }
        if self.monitor.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "monitor.poll_interval must be positive".into(),
            ));
        }
        let policy = &self.policy;
        if policy.low_rate_per_min < 0.0 || policy.low_rate_per_min > policy.high_rate_per_min {
            return Err(ConfigError::Invalid(format!(
                "policy rates must satisfy 0 <= low ({}) <= high ({})",
                policy.low_rate_per_min, policy.high_rate_per_min
            )));
        }
        if !(policy.partial_success_ratio > 0.0 && policy.partial_success_ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "policy.partial_success_ratio must be in (0, 1], got {}",
                policy.partial_success_ratio
            )));
        }
        Ok(())
    }
}
