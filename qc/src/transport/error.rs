//! Transport error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes reported by the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    ConnectionError,
    IncorrectRequest,
    CodeNotExists,
    #[serde(other)]
    Unknown,
}

/// One error entry from a failed response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: ErrorCode,
    pub message: String,
}

impl ResponseError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A failed call, with whatever the remote said about it
#[derive(Debug, Clone, Error)]
#[error("Request {method} {url} failed{}", summarize(.errors))]
pub struct HttpClientError {
    pub method: String,
    pub url: String,
    errors: Vec<ResponseError>,
}

fn summarize(errors: &[ResponseError]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let parts: Vec<_> = errors.iter().map(|e| format!("{:?}: {}", e.code, e.message)).collect();
    format!(": {}", parts.join("; "))
}

impl HttpClientError {
    pub fn new(method: impl Into<String>, url: impl Into<String>, errors: Vec<ResponseError>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            errors,
        }
    }

    /// Map a non-success response to an error
    ///
    /// Server errors become a single `ConnectionError`; otherwise the body's
    /// `errors` list is taken verbatim, or its `message` is reported as
    /// `CodeNotExists`.
    pub fn from_response(method: &str, url: &str, status: u16, reason: Option<&str>, body: &str) -> Self {
        if status >= 500 {
            let message = format!("status:{}, message:{}", status, reason.unwrap_or("unknown"));
            return Self::new(method, url, vec![ResponseError::new(ErrorCode::ConnectionError, message)]);
        }

        let body: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
        if let Some(errors) = body
            .get("errors")
            .and_then(|e| serde_json::from_value::<Vec<ResponseError>>(e.clone()).ok())
        {
            return Self::new(method, url, errors);
        }
        if let Some(message) = body.get("message").and_then(|m| m.as_str()) {
            return Self::new(method, url, vec![ResponseError::new(ErrorCode::CodeNotExists, message)]);
        }
        Self::new(method, url, vec![])
    }

    /// Map a failure that produced no response at all
    pub fn from_transport(method: &str, url: &str, err: &reqwest::Error) -> Self {
        let code = if err.is_builder() {
            ErrorCode::IncorrectRequest
        } else {
            ErrorCode::ConnectionError
        };
        Self::new(method, url, vec![ResponseError::new(code, err.to_string())])
    }

    pub fn errors(&self) -> &[ResponseError] {
        &self.errors
    }

    /// Check if the remote could not be reached or failed on its side
    pub fn is_connection_error(&self) -> bool {
        self.errors.iter().any(|e| e.code == ErrorCode::ConnectionError)
    }
}
