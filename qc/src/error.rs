//! Client error types

use thiserror::Error;

use crate::scheduler::SchedulerError;
use crate::transport::{HttpClientError, ResponseError};

/// Errors returned by [`crate::ApiClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] HttpClientError),

    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("API key not found. Set the {0} environment variable.")]
    MissingApiKey(String),

    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

impl ClientError {
    /// Error entries reported by the remote, if the call reached it
    pub fn errors(&self) -> &[ResponseError] {
        match self {
            ClientError::Http(e) => e.errors(),
            _ => &[],
        }
    }

    /// Check if this is a transport-level failure
    pub fn is_connection_error(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_connection_error())
    }
}
