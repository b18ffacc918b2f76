use pvemon_core::{ClusterApi, Config, CoreError, ResourceEntry, StatusEntry};
use serde::Deserialize;
use std::collections::BTreeMap;

/// JSON envelope every Proxmox API endpoint wraps its payload in.
#[derive(Deserialize)]
struct ApiResponse<T> {
    data: T,
}

/// Blocking Proxmox VE API client using API token authentication.
pub struct PveClient {
    http: reqwest::blocking::Client,
    base_url: String,
    auth_header: String,
}

impl PveClient {
    pub fn new(host: &str, config: &Config) -> Result<Self, CoreError> {
        let token_id = config
            .token_id
            .as_deref()
            .ok_or_else(|| CoreError::config("API token id is required"))?;
        let token_secret = config
            .token_secret
            .as_deref()
            .ok_or_else(|| CoreError::config("API token secret is required"))?;

        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| CoreError::api(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: format!("https://{}:{}/api2/json", host, config.port),
            auth_header: format!(
                "PVEAPIToken={}!{}={}",
                config.user, token_id, token_secret
            ),
        })
    }

    fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, CoreError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .map_err(|e| CoreError::api(format!("GET {} failed: {}", path, e)))?
            .error_for_status()
            .map_err(|e| CoreError::api(format!("GET {} failed: {}", path, e)))?;

        let envelope: ApiResponse<T> = response
            .json()
            .map_err(|e| CoreError::api(format!("GET {} returned invalid JSON: {}", path, e)))?;

        Ok(envelope.data)
    }
}

impl ClusterApi for PveClient {
    fn cluster_status(&self) -> Result<Vec<StatusEntry>, CoreError> {
        self.get("/cluster/status")
    }

    fn cluster_resources(&self, type_filter: Option<&str>) -> Result<Vec<ResourceEntry>, CoreError> {
        match type_filter {
            Some(kind) => self.get(&format!("/cluster/resources?type={}", kind)),
            None => self.get("/cluster/resources"),
        }
    }

    fn version(&self) -> Result<BTreeMap<String, String>, CoreError> {
        // Version values are numbers or strings depending on the PVE
        // release; flatten everything to strings for the collector.
        let raw: BTreeMap<String, serde_json::Value> = self.get("/version")?;
        Ok(raw
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect())
    }
}
