use super::Collector;
use crate::{
    api::ClusterApi,
    error::{CoreError, Result},
    model::MetricFamily,
};

/// Keys of the version record that become labels. Everything else the
/// endpoint returns (console settings etc.) is dropped.
const LABEL_WHITELIST: [&str; 3] = ["release", "repoid", "version"];

/// Collects Proxmox VE build information.
///
/// ```text
/// # HELP pve_version_info Proxmox VE version info
/// # TYPE pve_version_info gauge
/// pve_version_info{release="15",repoid="7599e35a",version="4.4"} 1
/// ```
///
/// The label set is the intersection of the whitelist with the keys the
/// endpoint actually returned, so a partial record still exposes what
/// it can. An empty intersection is a malformed response.
pub struct VersionCollector<'a, A> {
    api: &'a A,
}

impl<'a, A: ClusterApi> VersionCollector<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }
}

impl<'a, A: ClusterApi> Collector for VersionCollector<'a, A> {
    fn name(&self) -> &'static str {
        "version"
    }

    fn collect(&self) -> Result<Vec<MetricFamily>> {
        let version = self.api.version()?;

        let mut labels = Vec::new();
        let mut values = Vec::new();
        for key in LABEL_WHITELIST {
            if let Some(value) = version.get(key) {
                labels.push(key.to_string());
                values.push(value.clone());
            }
        }

        if labels.is_empty() {
            return Err(CoreError::malformed(
                "version endpoint returned none of the expected keys",
            ));
        }

        let mut family = MetricFamily::gauge(
            "pve_version_info".to_string(),
            "Proxmox VE version info".to_string(),
            labels,
        );
        family.sample(values, 1.0);

        Ok(vec![family])
    }
}
