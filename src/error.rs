//! Error types for asset delivery operations
//!
//! Most failures inside this crate are absorbed (cache misses, skipped
//! background frames). The variants here are what remains visible to callers.

use thiserror::Error;

/// Main error type for cache, planner and catalog operations
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Key-value store unreachable or rejected the command
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Asset origin returned an error or the request could not be sent
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Asset request exceeded its time budget
    #[error("Request timed out after {timeout_ms}ms: {url}")]
    Timeout { timeout_ms: u64, url: String },

    /// No tier entry exists for the requested combination
    #[error("No tier found for {config_id}/{material_id} ({tier} on {device})")]
    NoTierFound {
        config_id: String,
        material_id: String,
        tier: String,
        device: String,
    },

    /// One or more eager frames failed to load
    #[error("Eager phase failed: {failed} of {attempted} frames did not load")]
    EagerPhaseFailed { failed: usize, attempted: usize },

    /// Catalog source could not supply the requested data
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for delivery operations
pub type Result<T> = std::result::Result<T, DeliveryError>;

impl DeliveryError {
    /// Status code reported to the performance governor for this error
    pub fn status_code(&self) -> u16 {
        match self {
            DeliveryError::NoTierFound { .. } => 404,
            DeliveryError::Config(_) => 400,
            DeliveryError::Timeout { .. } => 504,
            DeliveryError::Fetch { .. } | DeliveryError::EagerPhaseFailed { .. } => 502,
            DeliveryError::Store(_) | DeliveryError::Catalog(_) => 503,
            DeliveryError::Serialization(_) | DeliveryError::Other(_) => 500,
        }
    }
}

impl From<serde_json::Error> for DeliveryError {
    fn from(e: serde_json::Error) -> Self {
        DeliveryError::Serialization(e.to_string())
    }
}

impl From<String> for DeliveryError {
    fn from(s: String) -> Self {
        DeliveryError::Other(s)
    }
}

impl From<&str> for DeliveryError {
    fn from(s: &str) -> Self {
        DeliveryError::Other(s.to_string())
    }
}
