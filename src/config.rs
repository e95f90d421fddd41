//! Configuration for the relay pipeline
//!
//! Every field has a default, so the pipeline runs without any config file;
//! a YAML file can override endpoints, the artifact path, and retry tuning.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct RelayConfig {
    /// Query endpoint configuration
    #[serde(default)]
    #[validate(nested)]
    pub source: SourceConfig,

    /// Archive artifact configuration
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Write endpoint and retry configuration
    #[serde(default)]
    #[validate(nested)]
    pub delivery: DeliveryConfig,
}

/// Query endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SourceConfig {
    /// GraphQL endpoint serving the countries query
    #[serde(default = "default_source_endpoint")]
    #[validate(url)]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
}

/// Archive artifact settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    /// Path of the CSV artifact
    #[serde(default = "default_archive_path")]
    pub path: PathBuf,
}

/// Write endpoint and retry settings
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DeliveryConfig {
    /// REST endpoint accepting the derived posts
    #[serde(default = "default_delivery_endpoint")]
    #[validate(url)]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,

    /// Owner id attached to every payload
    #[serde(default = "default_user_id")]
    pub user_id: u64,

    /// Retry budget after a retryable first response
    #[serde(default = "default_max_retries")]
    #[validate(range(max = 10))]
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds; doubles each retry
    #[serde(default = "default_retry_backoff_ms")]
    #[validate(range(min = 100, max = 60000))]
    pub retry_backoff_ms: u64,
}

fn default_source_endpoint() -> String {
    "https://countries.trevorblades.com/".to_string()
}

fn default_delivery_endpoint() -> String {
    "https://jsonplaceholder.typicode.com/posts".to_string()
}

fn default_archive_path() -> PathBuf {
    PathBuf::from("countries.csv")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_id() -> u64 {
    1
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_source_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: default_archive_path(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_delivery_endpoint(),
            timeout_secs: default_timeout_secs(),
            user_id: default_user_id(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl RelayConfig {
    /// Load and validate a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        config
            .validate()
            .map_err(|e| RelayError::config(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();

        assert_eq!(config.source.endpoint, "https://countries.trevorblades.com/");
        assert_eq!(
            config.delivery.endpoint,
            "https://jsonplaceholder.typicode.com/posts"
        );
        assert_eq!(config.archive.path, PathBuf::from("countries.csv"));
        assert_eq!(config.delivery.user_id, 1);
        assert_eq!(config.delivery.max_retries, 5);
        assert_eq!(config.delivery.retry_backoff_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
            archive:
              path: /tmp/out.csv
            delivery:
              max_retries: 3
        "#;

        let config: RelayConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.archive.path, PathBuf::from("/tmp/out.csv"));
        assert_eq!(config.delivery.max_retries, 3);
        // Untouched sections keep their defaults
        assert_eq!(config.delivery.retry_backoff_ms, 1000);
        assert_eq!(config.source.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let yaml = r#"
            source:
              endpoint: not-a-url
        "#;

        let config: RelayConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_excessive_retry_budget_rejected() {
        let yaml = r#"
            delivery:
              max_retries: 50
        "#;

        let config: RelayConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let result = RelayConfig::from_file(Path::new("/nonexistent/relay.yaml"));
        assert!(matches!(result, Err(RelayError::Io(_))));
    }
}
