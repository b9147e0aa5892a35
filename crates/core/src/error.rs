//! Error types for the dcmap system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the dcmap system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing credentials, bad settings).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level failure while fetching a vantage point report.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The measurement source answered, but not with a usable status.
    #[error("Source status error: {0}")]
    Status(String),

    /// A report could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No vantage point produced usable data.
    #[error("No data: {0}")]
    NoData(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a fetch error.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Error::Fetch(msg.into())
    }

    /// Create a source status error.
    pub fn status(msg: impl Into<String>) -> Self {
        Error::Status(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a no-data error.
    pub fn no_data(msg: impl Into<String>) -> Self {
        Error::NoData(msg.into())
    }
}
