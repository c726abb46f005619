//! HTTP transport backed by reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, info};

use super::{HttpClientError, Transport, query_pairs};
use crate::config::HttpConfig;
use crate::error::ClientError;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// HTTP transport that authenticates with an API key header
pub struct HttpTransport {
    api_key: String,
    http: Client,
}

impl HttpTransport {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        debug!(?timeout, "HttpTransport::new: called");
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key: api_key.into(),
            http,
        })
    }

    /// Create a transport from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &HttpConfig) -> Result<Self, ClientError> {
        debug!(?config, "HttpTransport::from_config: called");
        let api_key = config.get_api_key()?;
        Self::new(api_key, Duration::from_millis(config.timeout_ms))
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/json")
    }

    async fn execute(&self, method: &str, url: &str, request: RequestBuilder) -> Result<Value, HttpClientError> {
        let response = self
            .with_headers(request)
            .send()
            .await
            .map_err(|e| HttpClientError::from_transport(method, url, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| HttpClientError::from_transport(method, url, &e))?;

        if !status.is_success() {
            debug!(%method, %url, %status, "HttpTransport::execute: non-success status");
            return Err(HttpClientError::from_response(
                method,
                url,
                status.as_u16(),
                status.canonical_reason(),
                &text,
            ));
        }

        Ok(parse_body(&text))
    }
}

/// JSON bodies are parsed; anything else comes back as a string
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: Option<&Value>) -> Result<Value, HttpClientError> {
        let pairs = query.map(query_pairs).unwrap_or_default();
        info!(%url, ?pairs, "GET {}", url);
        let request = self.http.get(url).query(&pairs);
        self.execute("GET", url, request).await
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, HttpClientError> {
        let pretty = serde_json::to_string_pretty(body).unwrap_or_default();
        info!(%url, "POST {} {}", url, pretty);
        let request = self.http.post(url).json(body);
        self.execute("POST", url, request).await
    }
}
