//! Delivery pipeline: the per-record retry/backoff state machine
//!
//! Each country is rebuilt into a fresh payload per attempt and driven through
//! an explicit retry loop carrying `(attempts_remaining, attempt)`; the sleep
//! before each retry comes from `RetryPolicy::delay_for_attempt`.
//! Classification of the first response decides the path:
//!
//! - success → `Delivered`
//! - 403 → `Skipped`, no retry
//! - 500 → retry loop (budget 5, delay 1000 ms doubling, no jitter)
//! - any other status or a network failure → abandoned without touching the
//!   retry budget
//!
//! Inside the retry loop only success vs. failure is distinguished. Nothing in
//! this module raises past `deliver`; every failure is absorbed into the
//! returned outcome so one bad record never aborts the batch.

use crate::config::DeliveryConfig;
use crate::error::DeliveryError;
use crate::types::{Country, DeliveryOutcome, PostPayload, PostReceipt};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};

/// Deterministic backoff policy for the retry loop
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retry budget after a retryable first response
    pub max_retries: u32,
    /// Delay before the first retry; doubles after every failed retry
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Delay before retry `attempt` (1-indexed): strictly doubling, no jitter
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        // cap the exponent to keep the shift in range
        let capped = attempt.min(30);
        self.initial_delay.saturating_mul(1 << (capped - 1))
    }
}

/// Seam for the write side of the pipeline. Production uses
/// [`HttpWriteEndpoint`]; tests substitute a scripted implementation.
#[async_trait]
pub trait WriteEndpoint: Send + Sync {
    async fn post(&self, payload: &PostPayload) -> Result<PostReceipt, DeliveryError>;
}

/// reqwest-backed write endpoint
pub struct HttpWriteEndpoint {
    client: reqwest::Client,
    url: String,
}

impl HttpWriteEndpoint {
    /// Create a new endpoint with its own HTTP client.
    ///
    /// # Errors
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: &DeliveryConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self {
            client,
            url: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl WriteEndpoint for HttpWriteEndpoint {
    async fn post(&self, payload: &PostPayload) -> Result<PostReceipt, DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<PostReceipt>()
                .await
                .map_err(|e| DeliveryError::Network(format!("failed to parse response: {e}")))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DeliveryError::Status {
                code: status.as_u16(),
                body,
            })
        }
    }
}

/// Atomic counters for delivery observability
#[derive(Debug, Default)]
pub struct DeliveryStats {
    /// Write calls issued, including retries
    pub requests_sent: AtomicU64,
    /// Retry attempts issued
    pub requests_retried: AtomicU64,
    /// Records that reached `Delivered`
    pub delivered: AtomicU64,
    /// Records that reached `Skipped`
    pub skipped: AtomicU64,
    /// Records that reached `Exhausted`
    pub exhausted: AtomicU64,
}

/// Drives one record at a time through the retry/backoff state machine
pub struct DeliveryPipeline<E> {
    endpoint: E,
    policy: RetryPolicy,
    user_id: u64,
    stats: DeliveryStats,
}

impl<E: WriteEndpoint> DeliveryPipeline<E> {
    pub fn new(endpoint: E, policy: RetryPolicy, user_id: u64) -> Self {
        Self {
            endpoint,
            policy,
            user_id,
            stats: DeliveryStats::default(),
        }
    }

    /// Counters for this pipeline
    pub fn stats(&self) -> &DeliveryStats {
        &self.stats
    }

    /// Deliver one record. Never fails past this boundary.
    pub async fn deliver(&self, country: &Country) -> DeliveryOutcome {
        let payload = PostPayload::from_country(country, self.user_id);
        self.stats.requests_sent.fetch_add(1, Ordering::Relaxed);

        match self.endpoint.post(&payload).await {
            Ok(receipt) => {
                info!(country = %country.name, post_id = receipt.id, "delivered");
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                DeliveryOutcome::Delivered {
                    post_id: receipt.id,
                }
            }
            Err(err) if err.is_forbidden() => {
                warn!(country = %country.name, "403 from write endpoint, skipping record");
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                DeliveryOutcome::Skipped
            }
            Err(err) if err.is_retryable() => {
                warn!(country = %country.name, %err, "retryable failure, entering retry loop");
                self.retry(country).await
            }
            Err(err) => {
                // Abandon without consuming the retry budget
                error!(country = %country.name, %err, "delivery failed, abandoning record");
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                DeliveryOutcome::Skipped
            }
        }
    }

    /// Explicit retry loop. The sleep before retry N is
    /// `RetryPolicy::delay_for_attempt(N)`, so the schedule the policy
    /// advertises is the schedule the loop runs.
    async fn retry(&self, country: &Country) -> DeliveryOutcome {
        let mut attempts_remaining = self.policy.max_retries;
        let mut attempt = 0;

        while attempts_remaining > 0 {
            attempt += 1;
            tokio::time::sleep(self.policy.delay_for_attempt(attempt)).await;
            attempts_remaining -= 1;

            // Rebuild the payload fresh for every attempt
            let payload = PostPayload::from_country(country, self.user_id);
            self.stats.requests_sent.fetch_add(1, Ordering::Relaxed);
            self.stats.requests_retried.fetch_add(1, Ordering::Relaxed);

            match self.endpoint.post(&payload).await {
                Ok(receipt) => {
                    info!(
                        country = %country.name,
                        post_id = receipt.id,
                        "delivered after retry"
                    );
                    self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                    return DeliveryOutcome::Delivered {
                        post_id: receipt.id,
                    };
                }
                Err(err) if attempts_remaining > 0 => {
                    warn!(
                        country = %country.name,
                        %err,
                        attempts_remaining,
                        next_delay = ?self.policy.delay_for_attempt(attempt + 1),
                        "retry failed, backing off"
                    );
                }
                Err(err) => {
                    error!(country = %country.name, %err, "max retries reached, abandoning record");
                }
            }
        }

        self.stats.exhausted.fetch_add(1, Ordering::Relaxed);
        DeliveryOutcome::Exhausted
    }
}
