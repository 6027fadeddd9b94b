//! Error types and handling.

use chrono::NaiveDate;
use thiserror::Error;

/// Error returned by an external data source (attendance, leave, payroll,
/// schedule or directory service).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Transport-level failure (connection refused, bad status, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The source did not answer in time.
    #[error("Request timed out")]
    Timeout,

    /// Requested entity does not exist upstream.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payload could not be decoded into records.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl SourceError {
    /// Create a transport error with message
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a decode error with message
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// A primary dataset could not be loaded; the report build is aborted.
    #[error("Failed to load {dataset} data")]
    PrimaryFetch {
        dataset: &'static str,
        #[source]
        source: SourceError,
    },

    /// Custom range whose start lies after its end
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Another report build is still running for this service
    #[error("A report is already being generated")]
    ReportInProgress,

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Wrap a source failure for a primary dataset
    pub fn primary(dataset: &'static str, source: SourceError) -> Self {
        Self::PrimaryFetch { dataset, source }
    }

    /// Create a parse error with message
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a config error with message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
