//! Error types for the completion_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for completion_core operations
///
/// Data-shape problems in completion rows never surface here: malformed rows
/// are dropped with a warning and missing program data yields an empty tree.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Program definition has an unexpected shape (e.g. `weeks` is not an array)
    #[error("Malformed program definition: {0}")]
    MalformedProgram(String),

    /// A newer aggregation request superseded this one
    #[error("Stale request {token} (latest is {latest})")]
    StaleRequest { token: u64, latest: u64 },
}

impl Error {
    /// True for errors that callers should discard without reporting
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::StaleRequest { .. })
    }
}
