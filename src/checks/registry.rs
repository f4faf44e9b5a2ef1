//! Check registry
//!
//! Central registry of all available checks, in execution order.
//!
//! ## Check Ordering
//!
//! 1. **Network** and **discovery** run first. Discovery may supply the
//!    broker address.
//! 2. The broker address is resolved once.
//! 3. **Broker**, **config** and **monitoring** run with the resolved
//!    address. Monitoring runs last because it blocks for its whole window.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

use super::traits::{Check, Stage};
use super::{BrokerCheck, DeviceConfigCheck, DiscoveryCheck, MonitoringCheck, NetworkCheck};

/// Global registry of all available checks
///
/// Uses IndexMap to preserve insertion order, which is the run order.
pub static CHECKS: Lazy<IndexMap<&'static str, Arc<dyn Check>>> = Lazy::new(|| {
    let mut m: IndexMap<&'static str, Arc<dyn Check>> = IndexMap::new();

    m.insert("network", Arc::new(NetworkCheck));
    m.insert("discovery", Arc::new(DiscoveryCheck));

    m.insert("broker", Arc::new(BrokerCheck));
    m.insert("config", Arc::new(DeviceConfigCheck));
    m.insert("monitoring", Arc::new(MonitoringCheck));

    m
});

/// Checks of one stage, in run order
pub fn checks_in_stage(stage: Stage) -> Vec<Arc<dyn Check>> {
    CHECKS
        .values()
        .filter(|c| c.stage() == stage)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_checks_registered_in_order() {
        let names: Vec<_> = CHECKS.keys().copied().collect();
        assert_eq!(names, vec!["network", "discovery", "broker", "config", "monitoring"]);
    }

    #[test]
    fn test_registry_keys_match_check_names() {
        for (key, check) in CHECKS.iter() {
            assert_eq!(*key, check.name());
        }
    }

    #[test]
    fn test_stages() {
        let pre: Vec<_> = checks_in_stage(Stage::PreResolution)
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(pre, vec!["network", "discovery"]);

        let post: Vec<_> = checks_in_stage(Stage::PostResolution)
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(post, vec!["broker", "config", "monitoring"]);
    }
}
