//! Quota-aware API client
//!
//! Combines a [`Scheduler`] with a [`Transport`]: every call is queued,
//! throttled against the quotas, and only then sent.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::ClientError;
use crate::scheduler::Scheduler;
use crate::transport::{HttpTransport, Transport};

/// API client whose calls share one throttled delivery stream
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    scheduler: Scheduler,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, scheduler: Scheduler) -> Self {
        debug!(kind = %scheduler.strategy().kind(), "ApiClient::new: called");
        Self { transport, scheduler }
    }

    /// Build an HTTP client with the configured quotas and strategy
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        debug!(?config.quota, ?config.scheduler, "ApiClient::from_config: called");
        let transport = HttpTransport::from_config(&config.http)?;
        let scheduler = Scheduler::new(config.quota, config.scheduler);
        Ok(Self::new(Arc::new(transport), scheduler))
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Queue a GET request
    ///
    /// The request joins the queue when this is called, not when the returned
    /// future is first polled.
    pub fn schedule_get<Q, R>(
        &self,
        url: &str,
        params: Option<&Q>,
    ) -> impl Future<Output = Result<R, ClientError>> + Send + use<Q, R>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        debug!(%url, "ApiClient::schedule_get: called");
        let pending = params.map(serde_json::to_value).transpose().map(|query| {
            let transport = Arc::clone(&self.transport);
            let url = url.to_string();
            self.scheduler
                .enqueue(move || async move { transport.get(&url, query.as_ref()).await })
        });

        async move {
            let value = pending.map_err(ClientError::Encode)?.await??;
            decode(value)
        }
    }

    /// Queue a POST request
    ///
    /// The request joins the queue when this is called, not when the returned
    /// future is first polled.
    pub fn schedule_post<B, R>(
        &self,
        url: &str,
        body: &B,
    ) -> impl Future<Output = Result<R, ClientError>> + Send + use<B, R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        debug!(%url, "ApiClient::schedule_post: called");
        let pending = serde_json::to_value(body).map(|body| {
            let transport = Arc::clone(&self.transport);
            let url = url.to_string();
            self.scheduler
                .enqueue(move || async move { transport.post(&url, &body).await })
        });

        async move {
            let value = pending.map_err(ClientError::Encode)?.await??;
            decode(value)
        }
    }
}

fn decode<R: DeserializeOwned>(value: Value) -> Result<R, ClientError> {
    serde_json::from_value(value).map_err(ClientError::Decode)
}
