use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

/// Connection configuration for one scrape target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API user, e.g. `root@pam`
    pub user: String,

    /// API token id for token authentication
    pub token_id: Option<String>,

    /// API token secret
    pub token_secret: Option<String>,

    /// Cluster API port
    pub port: u16,

    /// Verify the cluster's TLS certificate
    pub verify_ssl: bool,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: "root@pam".to_string(),
            token_id: None,
            token_secret: None,
            port: 8006,
            verify_ssl: true,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources in order of preference:
    /// 1. CLI arguments override everything
    /// 2. JSON config file if specified
    /// 3. Default config file locations
    /// 4. Built-in defaults
    pub fn load(cli_config: Option<&CliConfig>, json_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(default_config) = Self::load_default_config()? {
            config.merge(default_config);
        }

        if let Some(path) = json_path {
            let file_config = Self::load_from_file(path)?;
            config.merge(file_config);
        }

        if let Some(cli) = cli_config {
            config.apply_cli_overrides(cli);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific JSON file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CoreError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            CoreError::config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        Ok(config)
    }

    /// Load configuration from default locations
    fn load_default_config() -> Result<Option<Self>> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(Some(config)),
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {}: {}", path.display(), e);
                        continue;
                    }
                }
            }
        }

        Ok(None)
    }

    /// Get default configuration file search paths
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("pvemon").join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".pvemon.json"));
        }

        paths.push(PathBuf::from("pvemon.json"));

        paths
    }

    /// Merge another configuration into this one, keeping non-default
    /// values from `other`
    fn merge(&mut self, other: Self) {
        let defaults = Self::default();

        if other.user != defaults.user {
            self.user = other.user;
        }
        if other.token_id.is_some() {
            self.token_id = other.token_id;
        }
        if other.token_secret.is_some() {
            self.token_secret = other.token_secret;
        }
        if other.port != defaults.port {
            self.port = other.port;
        }
        if other.verify_ssl != defaults.verify_ssl {
            self.verify_ssl = other.verify_ssl;
        }
        if other.timeout_secs != defaults.timeout_secs {
            self.timeout_secs = other.timeout_secs;
        }
    }

    /// Apply CLI argument overrides
    fn apply_cli_overrides(&mut self, cli: &CliConfig) {
        if let Some(user) = &cli.user {
            self.user = user.clone();
        }
        if let Some(token_id) = &cli.token_id {
            self.token_id = Some(token_id.clone());
        }
        if let Some(token_secret) = &cli.token_secret {
            self.token_secret = Some(token_secret.clone());
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if cli.insecure {
            self.verify_ssl = false;
        }
        if let Some(timeout) = cli.timeout_secs {
            self.timeout_secs = timeout;
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(CoreError::config("Request timeout must be at least 1 second"));
        }

        if self.timeout_secs > 300 {
            return Err(CoreError::config("Request timeout must be at most 5 minutes"));
        }

        if self.token_id.is_some() != self.token_secret.is_some() {
            return Err(CoreError::config(
                "Token authentication requires both token id and token secret",
            ));
        }

        Ok(())
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// CLI configuration (temporary struct for CLI parsing)
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub user: Option<String>,
    pub token_id: Option<String>,
    pub token_secret: Option<String>,
    pub port: Option<u16>,
    pub insecure: bool,
    pub timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();
        config.apply_cli_overrides(&CliConfig {
            user: Some("monitor@pve".to_string()),
            insecure: true,
            timeout_secs: Some(5),
            ..Default::default()
        });

        assert_eq!(config.user, "monitor@pve");
        assert!(!config.verify_ssl);
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_validate_rejects_partial_token() {
        let config = Config {
            token_id: Some("exporter".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
