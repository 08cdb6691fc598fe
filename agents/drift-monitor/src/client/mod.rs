//! Client for the inference cache server
//!
//! Fetches one region snapshot and turns it into a [`Dataset`]. A single
//! failed request aborts the run; there is no retry.

mod normalize;

pub use normalize::{flatten_record, records_from_payload, NESTED_SEPARATOR};

use std::time::Duration;
use tracing::info;

use crate::config::MonitorConfig;
use crate::dataset::Dataset;
use crate::error::{MonitorError, Result};

/// Inference cache client
pub struct CacheClient {
    server: String,
    region: String,
    fetch_limit: u64,
    client: reqwest::Client,
    timeout: Duration,
}

impl CacheClient {
    /// Create new client
    pub fn new(server: impl Into<String>, region: impl Into<String>, fetch_limit: u64) -> Self {
        Self {
            server: server.into(),
            region: region.into(),
            fetch_limit,
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(crate::config::DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }

    /// Create a client for the configured server, region and limit
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(&config.server, &config.region, config.fetch_limit)
            .with_timeout(config.request_timeout())
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// `{server}/{region}?limit={fetch_limit}`
    pub fn url(&self) -> String {
        format!("{}/{}?limit={}", self.server, self.region, self.fetch_limit)
    }

    /// Fetch the region snapshot as raw JSON
    pub async fn fetch_payload(&self) -> Result<serde_json::Value> {
        let url = self.url();
        info!(url = %url, "Fetch from url");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| MonitorError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MonitorError::Server {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| MonitorError::Network(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| MonitorError::parse(format!("invalid JSON: {}", e)))
    }

    /// Fetch and normalize the region snapshot
    pub async fn fetch_dataset(&self) -> Result<Dataset> {
        let payload = self.fetch_payload().await?;
        let records = records_from_payload(&payload, &self.region)?;
        let dataset = Dataset::from_records(records);

        info!(
            region = %self.region,
            records = dataset.len(),
            columns = dataset.columns().len(),
            "Fetched cache snapshot"
        );

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_format() {
        let client = CacheClient::new("http://cache:8080/gemfire-api/v1", "mds-region-greenplum", 1600);
        assert_eq!(
            client.url(),
            "http://cache:8080/gemfire-api/v1/mds-region-greenplum?limit=1600"
        );
    }

    #[test]
    fn test_from_config() {
        let config = MonitorConfig {
            server: "http://localhost:9000".to_string(),
            region: "snapshots".to_string(),
            fetch_limit: 5,
            ..Default::default()
        };
        let client = CacheClient::from_config(&config);
        assert_eq!(client.url(), config.datasource_url());
        assert_eq!(client.region(), "snapshots");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let client = CacheClient::new("http://127.0.0.1:9", "r", 1)
            .with_timeout(Duration::from_millis(200));
        let err = client.fetch_dataset().await.unwrap_err();
        assert!(matches!(err, MonitorError::Network(_)));
    }
}
