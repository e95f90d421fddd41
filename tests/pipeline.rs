//! End-to-end pipeline tests: source → archive → delivery
//!
//! These tests wire the runner with a static source and a scripted write
//! endpoint to verify the sequencing contract: the archive lands before any
//! delivery, an empty fetch writes nothing, a fetch failure stops everything,
//! and one record's failure never prevents the next record's delivery.

use async_trait::async_trait;
use country_relay::{
    Country, CsvArchiver, DeliveryError, DeliveryPipeline, PipelineRunner, PostPayload,
    PostReceipt, RecordSource, RelayError, Result, RetryPolicy, RunSummary, WriteEndpoint,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// Source returning a fixed record list
struct StaticSource {
    countries: Vec<Country>,
}

impl StaticSource {
    fn new(countries: Vec<Country>) -> Self {
        Self { countries }
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<Country>> {
        Ok(self.countries.clone())
    }
}

/// Source that always fails with a transport error
struct FailingSource;

#[async_trait]
impl RecordSource for FailingSource {
    async fn fetch(&self) -> Result<Vec<Country>> {
        Err(RelayError::transport("connection refused"))
    }
}

/// Write endpoint that pops one scripted response per attempt.
///
/// Scripting no responses doubles as an assertion that delivery is never
/// reached: any attempt panics.
struct ScriptedEndpoint {
    responses: Mutex<VecDeque<std::result::Result<PostReceipt, DeliveryError>>>,
}

impl ScriptedEndpoint {
    fn new(responses: Vec<std::result::Result<PostReceipt, DeliveryError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl WriteEndpoint for ScriptedEndpoint {
    async fn post(
        &self,
        _payload: &PostPayload,
    ) -> std::result::Result<PostReceipt, DeliveryError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted endpoint ran out of responses")
    }
}

fn ok(id: u64) -> std::result::Result<PostReceipt, DeliveryError> {
    Ok(PostReceipt { id })
}

fn server_error() -> std::result::Result<PostReceipt, DeliveryError> {
    Err(DeliveryError::Status {
        code: 500,
        body: String::new(),
    })
}

fn sample_countries() -> Vec<Country> {
    vec![
        Country::new("France", "Paris", "EUR"),
        Country::new("Japan", "Tokyo", "JPY"),
    ]
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(5, Duration::from_millis(1))
}

#[tokio::test]
async fn test_happy_path_archives_then_delivers_in_order() {
    let tmp = TempDir::new().unwrap();
    let csv_path = tmp.path().join("countries.csv");

    let runner = PipelineRunner::new(
        StaticSource::new(sample_countries()),
        CsvArchiver::with_path(&csv_path),
        DeliveryPipeline::new(ScriptedEndpoint::new(vec![ok(1), ok(2)]), fast_policy(), 1),
    );

    let summary = runner.run().await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            fetched: 2,
            delivered: 2,
            skipped: 0,
            exhausted: 0,
        }
    );

    let content = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "Country Name,Capital,Currency");
    assert_eq!(lines[1], "France,Paris,EUR");
    assert_eq!(lines[2], "Japan,Tokyo,JPY");
}

#[tokio::test]
async fn test_empty_fetch_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let csv_path = tmp.path().join("countries.csv");

    let runner = PipelineRunner::new(
        StaticSource::new(vec![]),
        CsvArchiver::with_path(&csv_path),
        DeliveryPipeline::new(ScriptedEndpoint::new(vec![]), fast_policy(), 1),
    );

    let summary = runner.run().await.unwrap();

    assert_eq!(summary, RunSummary::default());
    assert!(!csv_path.exists(), "archiver must not be invoked");
}

#[tokio::test]
async fn test_fetch_failure_aborts_before_archive_and_delivery() {
    let tmp = TempDir::new().unwrap();
    let csv_path = tmp.path().join("countries.csv");
    let endpoint = ScriptedEndpoint::new(vec![]);

    let runner = PipelineRunner::new(
        FailingSource,
        CsvArchiver::with_path(&csv_path),
        DeliveryPipeline::new(endpoint, fast_policy(), 1),
    );

    let result = runner.run().await;

    assert!(matches!(result, Err(RelayError::Transport(_))));
    assert!(!csv_path.exists());
}

#[tokio::test]
async fn test_archive_failure_aborts_before_delivery() {
    let runner = PipelineRunner::new(
        StaticSource::new(sample_countries()),
        CsvArchiver::with_path("/nonexistent-dir/countries.csv"),
        DeliveryPipeline::new(ScriptedEndpoint::new(vec![]), fast_policy(), 1),
    );

    let result = runner.run().await;

    assert!(matches!(result, Err(RelayError::Persistence(_))));
}

#[tokio::test]
async fn test_exhausted_record_does_not_block_the_next() {
    let tmp = TempDir::new().unwrap();

    // First record fails all 6 attempts, second record succeeds immediately
    let responses = vec![
        server_error(),
        server_error(),
        server_error(),
        server_error(),
        server_error(),
        server_error(),
        ok(2),
    ];
    let runner = PipelineRunner::new(
        StaticSource::new(sample_countries()),
        CsvArchiver::with_path(tmp.path().join("countries.csv")),
        DeliveryPipeline::new(ScriptedEndpoint::new(responses), fast_policy(), 1),
    );

    let summary = runner.run().await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            fetched: 2,
            delivered: 1,
            skipped: 0,
            exhausted: 1,
        }
    );
}

#[tokio::test]
async fn test_mixed_outcomes_tally() {
    let tmp = TempDir::new().unwrap();

    let countries = vec![
        Country::new("France", "Paris", "EUR"),
        Country::new("Japan", "Tokyo", "JPY"),
        Country::new("Chile", "Santiago", "CLP"),
    ];
    // delivered, 403-skipped, 404-abandoned
    let responses = vec![
        ok(1),
        Err(DeliveryError::Status {
            code: 403,
            body: String::new(),
        }),
        Err(DeliveryError::Status {
            code: 404,
            body: String::new(),
        }),
    ];
    let endpoint = ScriptedEndpoint::new(responses);
    let runner = PipelineRunner::new(
        StaticSource::new(countries),
        CsvArchiver::with_path(tmp.path().join("countries.csv")),
        DeliveryPipeline::new(endpoint, fast_policy(), 1),
    );

    let summary = runner.run().await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            fetched: 3,
            delivered: 1,
            skipped: 2,
            exhausted: 0,
        }
    );
}
