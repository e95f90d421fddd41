//! country-relay - resilient fetch/archive/deliver pipeline for country data
//!
//! Fetches country records from a GraphQL endpoint, archives them to a local
//! CSV artifact, then relays each record as an individual POST to a REST
//! endpoint, tolerating transient and permanent per-record failures without
//! aborting the batch.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌────────────────────┐
//! │ CountrySource│────▶│ CsvArchiver  │────▶│ DeliveryPipeline   │
//! │  (GraphQL)   │     │ (countries.  │     │ (POST + retry/     │
//! │              │     │    csv)      │     │  backoff per item) │
//! └──────────────┘     └──────────────┘     └────────────────────┘
//! ```
//!
//! Delivery is strictly sequential: record N reaches a terminal state
//! (delivered, skipped, or exhausted) before record N+1 begins. A fetch or
//! archive failure aborts the run; per-record delivery failures never do.

pub mod archive;
pub mod config;
pub mod delivery;
pub mod error;
pub mod runner;
pub mod source;
pub mod types;

pub use archive::CsvArchiver;
pub use config::RelayConfig;
pub use delivery::{DeliveryPipeline, DeliveryStats, HttpWriteEndpoint, RetryPolicy, WriteEndpoint};
pub use error::{DeliveryError, RelayError, Result};
pub use runner::PipelineRunner;
pub use source::{CountrySource, RecordSource};
pub use types::{Country, DeliveryOutcome, PostPayload, PostReceipt, RunSummary};
