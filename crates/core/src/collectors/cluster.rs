use super::Collector;
use crate::{
    api::{ClusterApi, StatusEntry},
    error::Result,
    model::{label_value, MetricFamily},
};

/// Build an info family from rows of (key, value) pairs.
///
/// The label set is taken from the first row; the upstream API sends
/// key-homogeneous entries per status type, but later rows missing a
/// key default to "" instead of faulting on that assumption. Returns
/// nothing at all for an empty row set, so an absent status type
/// produces no family rather than an empty one.
fn info_family(name: &str, help: &str, rows: Vec<Vec<(String, String)>>) -> Option<MetricFamily> {
    let first = rows.first()?;
    let labels: Vec<String> = first.iter().map(|(key, _)| key.clone()).collect();

    let mut family = MetricFamily::gauge(name.to_string(), help.to_string(), labels.clone());
    for row in &rows {
        let values = labels
            .iter()
            .map(|label| {
                row.iter()
                    .find(|(key, _)| key == label)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_default()
            })
            .collect();
        family.sample(values, 1.0);
    }

    Some(family)
}

/// Ordered (key, value) row for one status entry: the synthesized or
/// named keys first, then the remaining API keys in sorted order.
fn entry_row(named: Vec<(String, String)>, entry: &StatusEntry) -> Vec<(String, String)> {
    let mut row = named;
    for (key, value) in &entry.extra {
        row.push((key.clone(), label_value(value)));
    }
    row
}

/// Collects per-node cluster metadata.
///
/// ```text
/// # HELP pve_node_info Node info
/// # TYPE pve_node_info gauge
/// pve_node_info{id="node/pve1",name="pve1",ip="10.0.0.1",level="c",
///     local="1",nodeid="1"} 1
/// ```
pub struct ClusterNodeCollector<'a, A> {
    api: &'a A,
}

impl<'a, A: ClusterApi> ClusterNodeCollector<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }
}

impl<'a, A: ClusterApi> Collector for ClusterNodeCollector<'a, A> {
    fn name(&self) -> &'static str {
        "cluster-nodes"
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        let rows: Vec<_> = self
            .api
            .cluster_status()?
            .iter()
            .filter(|entry| entry.kind == "node")
            .map(|entry| {
                // The type tag and the online flag are bookkeeping, not
                // identity; they are covered by pve_up.
                let mut named = Vec::new();
                if let Some(id) = &entry.id {
                    named.push(("id".to_string(), id.clone()));
                }
                if let Some(name) = &entry.name {
                    named.push(("name".to_string(), name.clone()));
                }
                entry_row(named, entry)
            })
            .collect();

        Ok(info_family("pve_node_info", "Node info", rows)
            .into_iter()
            .collect())
    }
}

/// Collects cluster-wide metadata.
///
/// ```text
/// # HELP pve_cluster_info Cluster info
/// # TYPE pve_cluster_info gauge
/// pve_cluster_info{id="cluster/pvec",quorate="1",nodes="2",version="2"} 1
/// ```
pub struct ClusterInfoCollector<'a, A> {
    api: &'a A,
}

impl<'a, A: ClusterApi> ClusterInfoCollector<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }
}

impl<'a, A: ClusterApi> Collector for ClusterInfoCollector<'a, A> {
    fn name(&self) -> &'static str {
        "cluster-info"
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        let rows: Vec<_> = self
            .api
            .cluster_status()?
            .iter()
            .filter(|entry| entry.kind == "cluster")
            .map(|entry| {
                // The raw name key is folded into the id.
                let mut named = Vec::new();
                if let Some(name) = &entry.name {
                    named.push(("id".to_string(), format!("cluster/{}", name)));
                }
                if let Some(quorate) = entry.quorate {
                    named.push(("quorate".to_string(), quorate.to_string()));
                }
                entry_row(named, entry)
            })
            .collect();

        Ok(info_family("pve_cluster_info", "Cluster info", rows)
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::MockApi;
    use serde_json::json;

    #[test]
    fn test_node_labels_come_from_first_entry() {
        let api = MockApi::with_status(vec![
            json!({"type": "node", "id": "node/pve1", "name": "pve1", "online": 1,
                   "ip": "10.0.0.1", "level": "c", "local": 1, "nodeid": 1}),
            json!({"type": "node", "id": "node/pve2", "name": "pve2", "online": 1,
                   "ip": "10.0.0.2", "level": "", "local": 0, "nodeid": 2}),
            json!({"type": "cluster", "name": "pvec", "quorate": 1}),
        ]);

        let families = ClusterNodeCollector::new(&api).collect().unwrap();
        assert_eq!(families.len(), 1);

        let family = &families[0];
        assert_eq!(family.name, "pve_node_info");
        assert_eq!(
            family.label_names,
            vec!["id", "name", "ip", "level", "local", "nodeid"]
        );
        assert_eq!(family.samples.len(), 2);
        assert_eq!(
            family.samples[1].label_values,
            vec!["node/pve2", "pve2", "10.0.0.2", "", "0", "2"]
        );
    }

    #[test]
    fn test_node_missing_key_defaults_to_empty() {
        let api = MockApi::with_status(vec![
            json!({"type": "node", "id": "node/pve1", "name": "pve1", "online": 1, "ip": "10.0.0.1"}),
            json!({"type": "node", "id": "node/pve2", "name": "pve2", "online": 1}),
        ]);

        let families = ClusterNodeCollector::new(&api).collect().unwrap();
        assert_eq!(families[0].samples[1].label_values, vec!["node/pve2", "pve2", ""]);
    }

    #[test]
    fn test_cluster_id_is_synthesized() {
        let api = MockApi::with_status(vec![
            json!({"type": "node", "id": "node/pve1", "name": "pve1", "online": 1}),
            json!({"type": "cluster", "name": "pvec", "quorate": 1, "nodes": 2, "version": 2}),
        ]);

        let families = ClusterInfoCollector::new(&api).collect().unwrap();
        let family = &families[0];
        assert_eq!(family.name, "pve_cluster_info");
        assert_eq!(family.label_names, vec!["id", "quorate", "nodes", "version"]);
        assert_eq!(
            family.samples[0].label_values,
            vec!["cluster/pvec", "1", "2", "2"]
        );
    }

    #[test]
    fn test_empty_filtered_set_yields_no_family() {
        let api = MockApi::with_status(vec![
            json!({"type": "node", "id": "node/pve1", "name": "pve1", "online": 1}),
        ]);

        assert!(ClusterInfoCollector::new(&api).collect().unwrap().is_empty());

        let api = MockApi::with_status(vec![]);
        assert!(ClusterNodeCollector::new(&api).collect().unwrap().is_empty());
    }
}
