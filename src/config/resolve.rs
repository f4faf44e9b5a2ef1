//! Broker resolution
//!
//! Runs once, after discovery and before any check that talks to the
//! broker. The result is immutable for the rest of the run.

use serde::Serialize;

use super::settings::Settings;
use crate::checks::DiscoveredService;

/// Where the broker address came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerSource {
    /// Given on the command line or in the settings file
    Supplied,
    /// Promoted from the first discovered service
    Discovered,
    /// No broker known
    Missing,
}

impl std::fmt::Display for BrokerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerSource::Supplied => write!(f, "supplied"),
            BrokerSource::Discovered => write!(f, "discovered"),
            BrokerSource::Missing => write!(f, "missing"),
        }
    }
}

/// Broker address as seen by the broker-dependent checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub broker: Option<String>,
    pub source: BrokerSource,
}

impl ResolvedConfig {
    /// State before discovery has run: only a supplied broker is known
    pub fn supplied(settings: &Settings) -> Self {
        match &settings.broker.address {
            Some(address) => Self {
                broker: Some(address.clone()),
                source: BrokerSource::Supplied,
            },
            None => Self {
                broker: None,
                source: BrokerSource::Missing,
            },
        }
    }

    /// Pick the broker: a supplied address always wins over discovery
    pub fn resolve(settings: &Settings, discovered: &[DiscoveredService]) -> Self {
        let supplied = Self::supplied(settings);
        if supplied.broker.is_some() {
            return supplied;
        }

        match discovered.first() {
            Some(service) => {
                tracing::info!(
                    broker = %service.address,
                    service = %service.name,
                    "Using first discovered broker"
                );
                Self {
                    broker: Some(service.address.clone()),
                    source: BrokerSource::Discovered,
                }
            }
            None => supplied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str, address: &str) -> DiscoveredService {
        DiscoveredService {
            name: name.to_string(),
            hostname: format!("{name}.local"),
            address: address.to_string(),
            port: 1883,
        }
    }

    #[test]
    fn test_first_discovered_service_is_promoted() {
        let settings = Settings::default();
        let found = vec![service("a", "10.0.0.1"), service("b", "10.0.0.2")];
        let resolved = ResolvedConfig::resolve(&settings, &found);
        assert_eq!(resolved.broker.as_deref(), Some("10.0.0.1"));
        assert_eq!(resolved.source, BrokerSource::Discovered);
    }

    #[test]
    fn test_supplied_broker_never_overwritten() {
        let mut settings = Settings::default();
        settings.broker.address = Some("192.168.1.50".into());
        let found = vec![service("a", "10.0.0.1")];
        let resolved = ResolvedConfig::resolve(&settings, &found);
        assert_eq!(resolved.broker.as_deref(), Some("192.168.1.50"));
        assert_eq!(resolved.source, BrokerSource::Supplied);
    }

    #[test]
    fn test_nothing_discovered_leaves_broker_missing() {
        let settings = Settings::default();
        let resolved = ResolvedConfig::resolve(&settings, &[]);
        assert_eq!(resolved.broker, None);
        assert_eq!(resolved.source, BrokerSource::Missing);
    }
}
