//! Monitor configuration
//!
//! A single [`MonitorConfig`] is assembled once at startup and handed to each
//! component. Layers, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. an optional YAML or JSON file
//! 3. process environment (`inference_*` / `monitoring_*` variables)
//! 4. command-line overrides applied by the binary
//!
//! Empty environment values count as unset.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::contracts::SplitPolicy;
use crate::error::{MonitorError, Result};

/// Environment variable naming the cache server base URL
pub const ENV_CACHE_SERVER: &str = "inference_cache_server";
/// Environment variable naming the snapshot region
pub const ENV_SNAPSHOT_REGION: &str = "inference_snapshot_region";
/// Environment variable holding the fetch limit
pub const ENV_FETCH_SIZE: &str = "inference_cache_server_fetch_size";
/// Environment variable holding the monitoring batch size
pub const ENV_BATCH_SIZE: &str = "monitoring_batch_size";
/// Environment variable holding the pause between batches, in seconds
pub const ENV_BATCH_INTERVAL: &str = "monitoring_batch_processing_interval";

pub const DEFAULT_CACHE_SERVER: &str = "http://gfanomaly-server.tanzudatatap.com/gemfire-api/v1";
pub const DEFAULT_SNAPSHOT_REGION: &str = "mds-region-greenplum";
pub const DEFAULT_FETCH_SIZE: u64 = 1600;
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_BATCH_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_WORKSPACE: &str = "workspace";
pub const DEFAULT_PROJECT_NAME: &str = "Tanzu Realtime Anomaly Detection Project";
pub const DEFAULT_PROJECT_DESCRIPTION: &str =
    "Monitors credit card transactional data in near realtime.";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Configuration for one monitoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Cache server base URL
    pub server: String,

    /// Region holding the inference snapshot
    pub region: String,

    /// Maximum number of records requested from the cache
    pub fetch_limit: u64,

    /// Rows added to the monitored window per batch
    pub batch_size: usize,

    /// Pause after each batch, in seconds
    pub batch_interval_secs: u64,

    /// Root directory of the workspace store
    pub workspace: PathBuf,

    /// Current/reference split policy
    pub mode: SplitPolicy,

    /// Title of the project created for the run
    pub project_name: String,

    /// Description of the project created for the run
    pub project_description: String,

    /// Timeout for the cache request in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_CACHE_SERVER.to_string(),
            region: DEFAULT_SNAPSHOT_REGION.to_string(),
            fetch_limit: DEFAULT_FETCH_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_interval_secs: DEFAULT_BATCH_INTERVAL_SECS,
            workspace: PathBuf::from(DEFAULT_WORKSPACE),
            mode: SplitPolicy::Demo,
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            project_description: DEFAULT_PROJECT_DESCRIPTION.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl MonitorConfig {
    /// Load configuration: optional file, then the process environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read configuration from a YAML or JSON file (chosen by extension)
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );

        if is_yaml {
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// Overlay values found through `lookup` onto this configuration
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(server) = get(ENV_CACHE_SERVER) {
            self.server = server;
        }
        if let Some(region) = get(ENV_SNAPSHOT_REGION) {
            self.region = region;
        }
        if let Some(limit) = get(ENV_FETCH_SIZE) {
            self.fetch_limit = parse_number(ENV_FETCH_SIZE, &limit)?;
        }
        if let Some(size) = get(ENV_BATCH_SIZE) {
            self.batch_size = parse_number(ENV_BATCH_SIZE, &size)?;
        }
        if let Some(interval) = get(ENV_BATCH_INTERVAL) {
            self.batch_interval_secs = parse_number(ENV_BATCH_INTERVAL, &interval)?;
        }

        Ok(())
    }

    /// Check invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            return Err(MonitorError::config("cache server URL must not be empty"));
        }
        if self.region.trim().is_empty() {
            return Err(MonitorError::config("snapshot region must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(MonitorError::config("batch size must be positive"));
        }
        if self.batch_interval_secs == 0 {
            return Err(MonitorError::config("batch processing interval must be positive"));
        }
        if self.request_timeout_ms == 0 {
            return Err(MonitorError::config("request timeout must be positive"));
        }
        Ok(())
    }

    /// URL of the cache snapshot: `{server}/{region}?limit={fetch_limit}`
    pub fn datasource_url(&self) -> String {
        format!("{}/{}?limit={}", self.server, self.region, self.fetch_limit)
    }

    /// Pause between batches
    pub fn batch_interval(&self) -> Duration {
        Duration::from_secs(self.batch_interval_secs)
    }

    /// Timeout for the cache request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| MonitorError::config(format!("{} must be a non-negative integer, got '{}'", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(
            config.datasource_url(),
            "http://gfanomaly-server.tanzudatatap.com/gemfire-api/v1/mds-region-greenplum?limit=1600"
        );
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.batch_interval(), Duration::from_secs(10));
        assert_eq!(config.mode, SplitPolicy::Demo);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overlay() {
        let mut config = MonitorConfig::default();
        config
            .apply_env(lookup(&[
                (ENV_CACHE_SERVER, "http://localhost:7070/api"),
                (ENV_SNAPSHOT_REGION, "snapshots"),
                (ENV_FETCH_SIZE, "250"),
                (ENV_BATCH_SIZE, "50"),
                (ENV_BATCH_INTERVAL, "3"),
            ]))
            .unwrap();

        assert_eq!(config.datasource_url(), "http://localhost:7070/api/snapshots?limit=250");
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.batch_interval_secs, 3);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = MonitorConfig::default();
        config
            .apply_env(lookup(&[(ENV_SNAPSHOT_REGION, ""), (ENV_BATCH_SIZE, "  ")]))
            .unwrap();
        assert_eq!(config.region, DEFAULT_SNAPSHOT_REGION);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let mut config = MonitorConfig::default();
        let err = config
            .apply_env(lookup(&[(ENV_BATCH_SIZE, "ten")]))
            .unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let config = MonitorConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MonitorConfig {
            batch_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("monitor.yaml");
        std::fs::write(&path, "region: other-region\nbatch_size: 20\nmode: production\n").unwrap();

        let config = MonitorConfig::from_file(&path).unwrap();
        assert_eq!(config.region, "other-region");
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.mode, SplitPolicy::Production);
        assert_eq!(config.fetch_limit, DEFAULT_FETCH_SIZE);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("monitor.json");
        std::fs::write(&path, r#"{"fetch_limit": 10, "workspace": "ws"}"#).unwrap();

        let config = MonitorConfig::from_file(&path).unwrap();
        assert_eq!(config.fetch_limit, 10);
        assert_eq!(config.workspace, PathBuf::from("ws"));
    }
}
