//! Transport trait definition

use async_trait::async_trait;
use serde_json::Value;

use super::HttpClientError;

/// Performs the actual network call for a scheduled request
///
/// Implementations do no throttling of their own; the scheduler decides when
/// each call is made.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url`, with `query` (a JSON object) encoded into the query string
    async fn get(&self, url: &str, query: Option<&Value>) -> Result<Value, HttpClientError>;

    /// POST `body` as JSON to `url`
    async fn post(&self, url: &str, body: &Value) -> Result<Value, HttpClientError>;
}
