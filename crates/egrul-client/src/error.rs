//! EGRUL client error types

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for register lookups
pub type EgrulResult<T> = std::result::Result<T, EgrulError>;

/// Errors that can occur while talking to the register
#[derive(Debug, Error)]
pub enum EgrulError {
    /// Transport failure, timeout, or client construction error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The register answered with a non-success status
    #[error("unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    /// The body was not the JSON document the register returns
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}
