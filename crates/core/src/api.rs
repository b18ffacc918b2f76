use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One entry of the cluster status list, discriminated by `type`.
///
/// Node and cluster entries carry different key sets; the fields both
/// collectors need are named here, while the remaining keys (ip, level,
/// nodeid, nodes, version, ...) land in `extra` for the info collectors,
/// which iterate over whatever keys the API happened to send.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub online: Option<u8>,
    #[serde(default)]
    pub quorate: Option<u8>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One entry of the cluster resources list (guests, storage, nodes).
/// Every numeric usage field is optional; which ones are present
/// depends on the resource type and its current state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default)]
    pub maxdisk: Option<f64>,
    #[serde(default)]
    pub disk: Option<f64>,
    #[serde(default)]
    pub maxmem: Option<f64>,
    #[serde(default)]
    pub mem: Option<f64>,
    #[serde(default)]
    pub netout: Option<f64>,
    #[serde(default)]
    pub netin: Option<f64>,
    #[serde(default)]
    pub diskwrite: Option<f64>,
    #[serde(default)]
    pub diskread: Option<f64>,
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub maxcpu: Option<f64>,
    #[serde(default)]
    pub uptime: Option<f64>,
}

/// The recognized numeric usage keys of a resource entry. Scanning a
/// resource means walking this fixed set, not a reflective map walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKey {
    MaxDisk,
    Disk,
    MaxMem,
    Mem,
    NetOut,
    NetIn,
    DiskWrite,
    DiskRead,
    Cpu,
    MaxCpu,
    Uptime,
}

impl UsageKey {
    /// All usage keys, in the order their families are emitted.
    pub const ALL: [UsageKey; 11] = [
        Self::MaxDisk,
        Self::Disk,
        Self::MaxMem,
        Self::Mem,
        Self::NetOut,
        Self::NetIn,
        Self::DiskWrite,
        Self::DiskRead,
        Self::Cpu,
        Self::MaxCpu,
        Self::Uptime,
    ];

    pub fn metric_name(self) -> &'static str {
        match self {
            Self::MaxDisk => "pve_disk_size_bytes",
            Self::Disk => "pve_disk_usage_bytes",
            Self::MaxMem => "pve_memory_size_bytes",
            Self::Mem => "pve_memory_usage_bytes",
            Self::NetOut => "pve_network_transmit_bytes",
            Self::NetIn => "pve_network_receive_bytes",
            Self::DiskWrite => "pve_disk_write_bytes",
            Self::DiskRead => "pve_disk_read_bytes",
            Self::Cpu => "pve_cpu_usage_ratio",
            Self::MaxCpu => "pve_cpu_usage_limit",
            Self::Uptime => "pve_uptime_seconds",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Self::MaxDisk => "Size of storage device",
            Self::Disk => "Disk usage in bytes",
            Self::MaxMem => "Size of memory",
            Self::Mem => "Memory usage in bytes",
            Self::NetOut => "Number of bytes transmitted over the network",
            Self::NetIn => "Number of bytes received over the network",
            Self::DiskWrite => "Number of bytes written to storage",
            Self::DiskRead => "Number of bytes read from storage",
            Self::Cpu => "CPU usage (value between 0.0 and pve_cpu_usage_limit)",
            Self::MaxCpu => "Maximum allowed CPU usage",
            Self::Uptime => "Number of seconds since the last boot",
        }
    }

    /// Value of this key on a resource, if the resource carries it.
    pub fn value(self, resource: &ResourceEntry) -> Option<f64> {
        match self {
            Self::MaxDisk => resource.maxdisk,
            Self::Disk => resource.disk,
            Self::MaxMem => resource.maxmem,
            Self::Mem => resource.mem,
            Self::NetOut => resource.netout,
            Self::NetIn => resource.netin,
            Self::DiskWrite => resource.diskwrite,
            Self::DiskRead => resource.diskread,
            Self::Cpu => resource.cpu,
            Self::MaxCpu => resource.maxcpu,
            Self::Uptime => resource.uptime,
        }
    }
}

/// Narrow interface to the Proxmox VE management API. Transport, auth
/// and retry concerns live behind implementations of this trait; the
/// collectors only consume the typed record lists.
pub trait ClusterApi {
    /// `GET /cluster/status`
    fn cluster_status(&self) -> Result<Vec<StatusEntry>>;

    /// `GET /cluster/resources`, optionally filtered by resource type
    /// (e.g. "vm" for guests only).
    fn cluster_resources(&self, type_filter: Option<&str>) -> Result<Vec<ResourceEntry>>;

    /// `GET /version`
    fn version(&self) -> Result<BTreeMap<String, String>>;
}
