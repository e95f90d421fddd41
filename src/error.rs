//! Error types for country-relay
//!
//! Two tiers: `RelayError` for failures that abort the whole run (query
//! transport, archive persistence, configuration), and `DeliveryError` for
//! per-record write failures that are absorbed inside the delivery pipeline
//! and never cross its boundary.

use thiserror::Error;

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Fatal errors that terminate the run
#[derive(Error, Debug)]
pub enum RelayError {
    /// Query endpoint transport or protocol error
    #[error("transport error: {0}")]
    Transport(String),

    /// Archive write failed
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RelayError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Errors from a single write attempt against the write endpoint.
///
/// These never propagate past `DeliveryPipeline::deliver`; they only drive the
/// classification of the attempt (skip, retry, abandon).
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Non-success HTTP status from the write endpoint
    #[error("write endpoint returned {code}: {body}")]
    Status { code: u16, body: String },

    /// Network-level failure (connect, timeout, malformed response)
    #[error("network error: {0}")]
    Network(String),
}

impl DeliveryError {
    /// HTTP status code, if the endpoint answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            Self::Network(_) => None,
        }
    }

    /// 403 on the first response means the record is skipped outright
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Status { code: 403, .. })
    }

    /// Only a 500 on the first response enters the retry loop
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Status { code: 500, .. })
    }
}
