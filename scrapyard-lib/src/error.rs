use scrapyard_core::{CoreError, FieldKind};
use thiserror::Error;

/// Errors raised by the scrape engine and its collaborators.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The decision table had no rule for the file's flags and cache state
    #[error("No action could be determined for {0}")]
    UndeterminedAction(String),

    /// I/O error while hashing files or writing logs
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache read or write failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Artwork composition failure
    #[error("Compositor error: {0}")]
    Compositor(String),

    /// Malformed include/exclude pattern list
    #[error("Invalid file pattern: {0}")]
    Pattern(String),

    /// Invalid or unreadable configuration
    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// A file took longer than the per-file safety timeout
    #[error("Timed out after {0}s")]
    Timeout(u64),
}

impl EngineError {
    pub fn undetermined(file: impl Into<String>) -> Self {
        Self::UndeterminedAction(file.into())
    }

    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    pub fn compositor(msg: impl Into<String>) -> Self {
        Self::Compositor(msg.into())
    }

    pub fn pattern(msg: impl Into<String>) -> Self {
        Self::Pattern(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Fatal errors stop the worker instead of failing a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UndeterminedAction(_))
    }
}

/// Errors reported by source adapters.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The adapter could not be set up (credentials, missing folder, ...)
    #[error("Setup failed: {0}")]
    Setup(String),

    /// No request budget left
    #[error("Request quota exhausted")]
    QuotaExhausted,

    /// Transport failure or rejected request
    #[error("Request failed: {0}")]
    Request(String),

    /// The source answered with something unparseable
    #[error("Unexpected response: {0}")]
    Response(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source has no data for this field
    #[error("No {0} available")]
    Unavailable(FieldKind),
}

impl AdapterError {
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }

    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    pub fn response(msg: impl Into<String>) -> Self {
        Self::Response(msg.into())
    }

    /// True when the adapter instance can no longer issue requests.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Setup(_) | Self::QuotaExhausted)
    }
}
