use super::Collector;
use crate::{
    api::{ClusterApi, ResourceEntry, UsageKey},
    error::Result,
    model::MetricFamily,
};

/// Collects per-resource usage counters and guest/storage identity for
/// everything the cluster reports: nodes, guests and storage.
///
/// Usage families are sparse by construction: a resource contributes a
/// sample only for the usage keys it actually carries, so a stopped
/// guest simply has no `pve_uptime_seconds` sample instead of a zero.
pub struct ClusterResourcesCollector<'a, A> {
    api: &'a A,
}

impl<'a, A: ClusterApi> ClusterResourcesCollector<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }
}

fn guest_row(resource: &ResourceEntry) -> Vec<String> {
    vec![
        resource.id.clone(),
        resource.node.clone().unwrap_or_default(),
        resource.name.clone().unwrap_or_default(),
        resource.kind.clone(),
    ]
}

fn storage_row(resource: &ResourceEntry) -> Vec<String> {
    vec![
        resource.id.clone(),
        resource.node.clone().unwrap_or_default(),
        resource.storage.clone().unwrap_or_default(),
    ]
}

impl<'a, A: ClusterApi> Collector for ClusterResourcesCollector<'a, A> {
    fn name(&self) -> &'static str {
        "resources"
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        let mut usage: Vec<MetricFamily> = UsageKey::ALL
            .iter()
            .map(|key| {
                MetricFamily::gauge(
                    key.metric_name().to_string(),
                    key.help().to_string(),
                    vec!["id".to_string()],
                )
            })
            .collect();

        let mut guests = MetricFamily::gauge(
            "pve_guest_info".to_string(),
            "VM/CT info".to_string(),
            ["id", "node", "name", "type"]
                .map(String::from)
                .to_vec(),
        );
        let mut storage = MetricFamily::gauge(
            "pve_storage_info".to_string(),
            "Storage info".to_string(),
            ["id", "node", "storage"].map(String::from).to_vec(),
        );

        for resource in self.api.cluster_resources(None)? {
            match resource.kind.as_str() {
                "lxc" | "qemu" => guests.sample(guest_row(&resource), 1.0),
                "storage" => storage.sample(storage_row(&resource), 1.0),
                // Nodes and anything newer get usage samples only.
                _ => {}
            }

            for (key, family) in UsageKey::ALL.iter().zip(usage.iter_mut()) {
                if let Some(value) = key.value(&resource) {
                    family.sample(vec![resource.id.clone()], value);
                }
            }
        }

        usage.push(guests);
        usage.push(storage);
        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::MockApi;
    use serde_json::json;

    fn family<'f>(families: &'f [MetricFamily], name: &str) -> &'f MetricFamily {
        families.iter().find(|f| f.name == name).unwrap()
    }

    #[test]
    fn test_all_thirteen_families_always_emitted() {
        let api = MockApi::with_resources(vec![]);
        let families = ClusterResourcesCollector::new(&api).collect().unwrap();

        assert_eq!(families.len(), 13);
        assert_eq!(families[0].name, "pve_disk_size_bytes");
        assert_eq!(families[10].name, "pve_uptime_seconds");
        assert_eq!(families[11].name, "pve_guest_info");
        assert_eq!(families[12].name, "pve_storage_info");
        assert!(families.iter().all(|f| f.samples.is_empty()));
    }

    #[test]
    fn test_sparse_usage_and_guest_info() {
        let api = MockApi::with_resources(vec![json!({
            "type": "qemu", "id": "qemu/102", "node": "n1", "name": "vm1",
            "mem": 1024, "cpu": 0.5
        })]);

        let families = ClusterResourcesCollector::new(&api).collect().unwrap();

        let mem = family(&families, "pve_memory_usage_bytes");
        assert_eq!(mem.samples.len(), 1);
        assert_eq!(mem.samples[0].label_values, vec!["qemu/102"]);
        assert_eq!(mem.samples[0].value, 1024.0);

        let cpu = family(&families, "pve_cpu_usage_ratio");
        assert_eq!(cpu.samples[0].value, 0.5);

        assert!(family(&families, "pve_disk_size_bytes").samples.is_empty());

        let guests = family(&families, "pve_guest_info");
        assert_eq!(guests.label_names, vec!["id", "node", "name", "type"]);
        assert_eq!(
            guests.samples[0].label_values,
            vec!["qemu/102", "n1", "vm1", "qemu"]
        );
        assert_eq!(guests.samples[0].value, 1.0);

        assert!(family(&families, "pve_storage_info").samples.is_empty());
    }

    #[test]
    fn test_storage_info_defaults_missing_labels() {
        let api = MockApi::with_resources(vec![json!({
            "type": "storage", "id": "storage/n1/local", "node": "n1",
            "maxdisk": 100.0, "disk": 40.0
        })]);

        let families = ClusterResourcesCollector::new(&api).collect().unwrap();

        let storage = family(&families, "pve_storage_info");
        assert_eq!(storage.samples[0].label_values, vec!["storage/n1/local", "n1", ""]);

        assert_eq!(family(&families, "pve_disk_size_bytes").samples[0].value, 100.0);
        assert_eq!(family(&families, "pve_disk_usage_bytes").samples[0].value, 40.0);
    }

    #[test]
    fn test_unrecognized_type_contributes_usage_only() {
        let api = MockApi::with_resources(vec![json!({
            "type": "node", "id": "node/n1", "uptime": 3600, "maxcpu": 8
        })]);

        let families = ClusterResourcesCollector::new(&api).collect().unwrap();

        assert!(family(&families, "pve_guest_info").samples.is_empty());
        assert!(family(&families, "pve_storage_info").samples.is_empty());
        assert_eq!(family(&families, "pve_uptime_seconds").samples[0].value, 3600.0);
        assert_eq!(family(&families, "pve_cpu_usage_limit").samples[0].value, 8.0);
    }
}
