//! Runtime API client errors

use thiserror::Error;

/// Errors that can occur when talking to the Lambda Runtime API
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Runtime API answered with a non-success status
    #[error("Runtime API error: {status} - {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required invocation header was absent or unreadable
    #[error("missing or invalid header {0}")]
    MissingHeader(&'static str),

    /// Environment does not describe a Lambda sandbox
    #[error("Configuration error: {0}")]
    Configuration(String),
}
