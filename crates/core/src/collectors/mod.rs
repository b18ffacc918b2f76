pub mod cluster;
pub mod host;
pub mod resources;
pub mod status;
pub mod version;

pub use cluster::{ClusterInfoCollector, ClusterNodeCollector};
pub use host::{CpuFreqCollector, HddTempCollector, SensorsCollector};
pub use resources::ClusterResourcesCollector;
pub use status::StatusCollector;
pub use version::VersionCollector;

use crate::{
    api::ClusterApi,
    error::Result,
    model::{render_families, MetricFamily},
};
use tracing::debug;

/// A unit that maps one upstream data source into metric families.
pub trait Collector {
    /// Unique name for this collector (e.g. "status", "sensors").
    fn name(&self) -> &'static str;

    /// Produce this collector's metric families for one scrape.
    fn collect(&self) -> Result<Vec<MetricFamily>>;
}

/// Holds the collector set for one scrape target and runs each
/// collector once per scrape, in registration order.
///
/// A hard fault from any collector aborts the whole scrape; only the
/// host probes degrade internally (see [`host`]).
pub struct Registry<'a> {
    collectors: Vec<Box<dyn Collector + 'a>>,
}

impl<'a> Registry<'a> {
    pub fn new() -> Self {
        Self {
            collectors: Vec::new(),
        }
    }

    pub fn register(&mut self, collector: Box<dyn Collector + 'a>) {
        self.collectors.push(collector);
    }

    /// Run every registered collector once and concatenate the emitted
    /// families, preserving each collector's own output order.
    pub fn collect(&self) -> Result<Vec<MetricFamily>> {
        let mut families = Vec::new();
        for collector in &self.collectors {
            debug!(collector = collector.name(), "running collector");
            families.extend(collector.collect()?);
        }
        Ok(families)
    }
}

impl<'a> Default for Registry<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the full collector set bound to one cluster API client.
pub fn default_registry<A: ClusterApi>(api: &A) -> Registry<'_> {
    let mut registry = Registry::new();
    registry.register(Box::new(StatusCollector::new(api)));
    registry.register(Box::new(ClusterResourcesCollector::new(api)));
    registry.register(Box::new(ClusterNodeCollector::new(api)));
    registry.register(Box::new(ClusterInfoCollector::new(api)));
    registry.register(Box::new(VersionCollector::new(api)));
    registry.register(Box::new(SensorsCollector::new()));
    registry.register(Box::new(CpuFreqCollector::new()));
    registry.register(Box::new(HddTempCollector::new()));
    registry
}

/// Scrape one target: run the full collector set against the given
/// client and render the result as exposition-format text.
///
/// The registry and all families are built fresh per call so nothing
/// leaks between scrapes or between targets.
pub fn scrape<A: ClusterApi>(api: &A) -> Result<String> {
    let registry = default_registry(api);
    let families = registry.collect()?;
    Ok(render_families(&families))
}


#[cfg(test)]
mod tests {
    use super::{testing::MockApi, *};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn full_mock() -> MockApi {
        let mut version = BTreeMap::new();
        version.insert("release".to_string(), "15".to_string());
        version.insert("repoid".to_string(), "7599e35a".to_string());
        version.insert("version".to_string(), "4.4".to_string());

        MockApi {
            status: vec![
                json!({"type": "node", "id": "node/pve1", "name": "pve1", "online": 1}),
                json!({"type": "cluster", "name": "pvec", "quorate": 1, "nodes": 2, "version": 2}),
            ],
            resources: vec![
                json!({"type": "qemu", "id": "qemu/102", "node": "pve1", "name": "vm1",
                       "status": "running", "mem": 1024, "cpu": 0.5}),
            ],
            version,
        }
    }

    #[test]
    fn test_scrape_renders_all_collectors() {
        let api = full_mock();
        let out = scrape(&api).unwrap();

        assert!(out.contains("pve_up{id=\"node/pve1\"} 1"));
        assert!(out.contains("pve_version_info{"));
        assert!(out.contains("pve_node_info{"));
        assert!(out.contains("pve_cluster_info{"));
        assert!(out.contains("# TYPE pve_memory_usage_bytes gauge"));
        // Host probe families are present even when the probes find
        // nothing on the test machine.
        assert!(out.contains("# TYPE pve_host_sensors gauge"));
        assert!(out.contains("# TYPE pve_host_cpufreq gauge"));
        assert!(out.contains("# TYPE pve_host_hdd_temp gauge"));
    }

    #[test]
    fn test_scrape_is_idempotent() {
        let api = full_mock();
        // Host probes depend on live hardware, so pin the comparison to
        // the cluster-backed collectors.
        let run = || {
            let mut registry = Registry::new();
            registry.register(Box::new(StatusCollector::new(&api)));
            registry.register(Box::new(ClusterResourcesCollector::new(&api)));
            registry.register(Box::new(ClusterNodeCollector::new(&api)));
            registry.register(Box::new(ClusterInfoCollector::new(&api)));
            registry.register(Box::new(VersionCollector::new(&api)));
            render_families(&registry.collect().unwrap())
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_registry_aborts_on_hard_fault() {
        let api = MockApi::with_status(vec![json!({"type": "unknown", "id": "x"})]);
        let registry = default_registry(&api);
        assert!(registry.collect().is_err());
    }

    #[test]
    fn test_registry_preserves_collector_order() {
        let api = full_mock();
        let mut registry = Registry::new();
        registry.register(Box::new(VersionCollector::new(&api)));
        registry.register(Box::new(StatusCollector::new(&api)));

        let families = registry.collect().unwrap();
        assert_eq!(families[0].name, "pve_version_info");
        assert_eq!(families[1].name, "pve_up");
    }
}
