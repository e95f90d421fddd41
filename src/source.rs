//! Country source: one GraphQL query against the configured endpoint
//!
//! The query shape is fixed; there is no fetch-side retry. Any transport or
//! protocol failure is fatal to the run. An empty country list is a valid
//! non-error result.

use crate::config::SourceConfig;
use crate::error::{RelayError, Result};
use crate::types::Country;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const COUNTRIES_QUERY: &str = "{ countries { name capital currency } }";

/// Seam for the query side of the pipeline, so the runner can be exercised
/// without a live endpoint
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Country>>;
}

/// GraphQL-over-HTTP source for the countries dataset
pub struct CountrySource {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<CountriesData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct CountriesData {
    countries: Vec<Country>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl CountrySource {
    /// Create a new source with its own HTTP client.
    ///
    /// # Errors
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: &SourceConfig) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl RecordSource for CountrySource {
    async fn fetch(&self) -> Result<Vec<Country>> {
        debug!(endpoint = %self.endpoint, "querying countries");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": COUNTRIES_QUERY }))
            .send()
            .await
            .map_err(|e| RelayError::transport(format!("query request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::transport(format!(
                "query endpoint returned {status}: {body}"
            )));
        }

        let parsed: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| RelayError::transport(format!("failed to parse query response: {e}")))?;

        if let Some(err) = parsed.errors.first() {
            return Err(RelayError::transport(format!(
                "query endpoint returned error: {}",
                err.message
            )));
        }

        let data = parsed
            .data
            .ok_or_else(|| RelayError::transport("query response missing data"))?;

        info!(count = data.countries.len(), "fetched countries");
        Ok(data.countries)
    }
}
