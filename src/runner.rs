//! Pipeline orchestration: fetch → archive → deliver
//!
//! The runner fetches once, archives the full sequence before any delivery
//! attempt, then delivers each record strictly in source order, one at a time.
//! Per-record outcomes never abort the batch; only a fetch or archive failure
//! terminates the run.

use crate::archive::CsvArchiver;
use crate::config::RelayConfig;
use crate::delivery::{DeliveryPipeline, HttpWriteEndpoint, RetryPolicy, WriteEndpoint};
use crate::error::{RelayError, Result};
use crate::source::{CountrySource, RecordSource};
use crate::types::RunSummary;
use tracing::info;

/// Runs the three pipeline stages in order
pub struct PipelineRunner<S, E> {
    source: S,
    archiver: CsvArchiver,
    pipeline: DeliveryPipeline<E>,
}

impl PipelineRunner<CountrySource, HttpWriteEndpoint> {
    /// Wire up the production pipeline from configuration
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let source = CountrySource::new(&config.source)
            .map_err(|e| RelayError::config(format!("failed to build query client: {e}")))?;
        let endpoint = HttpWriteEndpoint::new(&config.delivery)
            .map_err(|e| RelayError::config(format!("failed to build write client: {e}")))?;
        let pipeline = DeliveryPipeline::new(
            endpoint,
            RetryPolicy::from_config(&config.delivery),
            config.delivery.user_id,
        );
        Ok(Self {
            source,
            archiver: CsvArchiver::new(&config.archive),
            pipeline,
        })
    }
}

impl<S: RecordSource, E: WriteEndpoint> PipelineRunner<S, E> {
    pub fn new(source: S, archiver: CsvArchiver, pipeline: DeliveryPipeline<E>) -> Self {
        Self {
            source,
            archiver,
            pipeline,
        }
    }

    /// Execute one run to completion.
    ///
    /// Returns the per-outcome tally; fails only on a fetch or archive error.
    pub async fn run(&self) -> Result<RunSummary> {
        let countries = self.source.fetch().await?;
        if countries.is_empty() {
            info!("no countries to deliver");
            return Ok(RunSummary::default());
        }

        // The archive must land before the first delivery attempt
        self.archiver.persist(&countries).await?;

        let mut summary = RunSummary {
            fetched: countries.len(),
            ..Default::default()
        };
        for country in &countries {
            let outcome = self.pipeline.deliver(country).await;
            summary.record(&outcome);
        }

        info!(
            fetched = summary.fetched,
            delivered = summary.delivered,
            skipped = summary.skipped,
            exhausted = summary.exhausted,
            "relay run complete"
        );
        Ok(summary)
    }
}
