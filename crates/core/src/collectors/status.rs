use super::Collector;
use crate::{
    api::ClusterApi,
    error::{CoreError, Result},
    model::MetricFamily,
};

/// Collects node/VM/CT up-state into a single `pve_up` family.
///
/// ```text
/// # HELP pve_up Node/VM/CT-Status is online/running
/// # TYPE pve_up gauge
/// pve_up{id="node/pve1"} 1
/// pve_up{id="cluster/pvec"} 1
/// pve_up{id="qemu/102"} 1
/// ```
pub struct StatusCollector<'a, A> {
    api: &'a A,
}

impl<'a, A: ClusterApi> StatusCollector<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }
}

impl<'a, A: ClusterApi> Collector for StatusCollector<'a, A> {
    fn name(&self) -> &'static str {
        "status"
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        let mut up = MetricFamily::gauge(
            "pve_up",
            "Node/VM/CT-Status is online/running",
            vec!["id".to_string()],
        );

        for entry in self.api.cluster_status()? {
            match entry.kind.as_str() {
                "node" => {
                    let id = entry
                        .id
                        .ok_or_else(|| CoreError::malformed("node status entry without id"))?;
                    let online = entry
                        .online
                        .ok_or_else(|| CoreError::malformed("node status entry without online flag"))?;
                    up.sample(vec![id], f64::from(online));
                }
                "cluster" => {
                    let name = entry
                        .name
                        .ok_or_else(|| CoreError::malformed("cluster status entry without name"))?;
                    let quorate = entry.quorate.ok_or_else(|| {
                        CoreError::malformed("cluster status entry without quorate flag")
                    })?;
                    up.sample(vec![format!("cluster/{}", name)], f64::from(quorate));
                }
                // Anything else means the API contract changed under us;
                // fail the scrape instead of silently dropping the entry.
                other => return Err(CoreError::unexpected_status_type(other)),
            }
        }

        for resource in self.api.cluster_resources(Some("vm"))? {
            let running = resource.status.as_deref() == Some("running");
            up.sample(vec![resource.id], if running { 1.0 } else { 0.0 });
        }

        Ok(vec![up])
    }
}
