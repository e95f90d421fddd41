//! Core data types for the relay pipeline

use serde::{Deserialize, Serialize};

/// One source record: a country with its capital and currency.
///
/// Immutable once fetched. The upstream schema marks `capital` and `currency`
/// as nullable; absent values render as empty strings downstream.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Country {
    pub name: String,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl Country {
    pub fn new(
        name: impl Into<String>,
        capital: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            capital: Some(capital.into()),
            currency: Some(currency.into()),
        }
    }
}

/// Payload posted to the write endpoint, derived one-to-one from a `Country`.
///
/// Rebuilt fresh for every attempt, including retries; never mutated across
/// attempts.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub title: String,
    pub body: String,
    pub user_id: u64,
}

impl PostPayload {
    /// Derive the payload for one country
    pub fn from_country(country: &Country, user_id: u64) -> Self {
        Self {
            title: format!("Country: {}", country.name),
            body: format!(
                "Capital: {}, Currency: {}",
                country.capital.as_deref().unwrap_or(""),
                country.currency.as_deref().unwrap_or("")
            ),
            user_id,
        }
    }
}

/// Success body from the write endpoint, carrying the assigned identifier
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PostReceipt {
    pub id: u64,
}

/// Terminal state of one record's delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Write accepted; carries the identifier assigned by the endpoint
    Delivered { post_id: u64 },
    /// Record abandoned without consuming the retry budget (403 or a
    /// non-retryable first-attempt failure)
    Skipped,
    /// Retry budget consumed without a success
    Exhausted,
}

/// Tally of one pipeline run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Records returned by the query endpoint
    pub fetched: usize,
    /// Records that reached `Delivered`
    pub delivered: usize,
    /// Records that reached `Skipped`
    pub skipped: usize,
    /// Records that reached `Exhausted`
    pub exhausted: usize,
}

impl RunSummary {
    /// Record one terminal outcome
    pub fn record(&mut self, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered { .. } => self.delivered += 1,
            DeliveryOutcome::Skipped => self.skipped += 1,
            DeliveryOutcome::Exhausted => self.exhausted += 1,
        }
    }
}
