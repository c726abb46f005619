//! Quota limits

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::UNBOUNDED;

/// Per-second, per-minute and per-hour request limits
///
/// A missing limit means the quota is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Max requests within one second
    #[serde(rename = "requests-per-second", skip_serializing_if = "Option::is_none")]
    pub requests_per_second: Option<u32>,

    /// Max requests within one minute
    #[serde(rename = "requests-per-minute", skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<u32>,

    /// Max requests within one hour
    #[serde(rename = "requests-per-hour", skip_serializing_if = "Option::is_none")]
    pub requests_per_hour: Option<u32>,
}

impl QuotaConfig {
    /// Quota with every limit unbounded
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_per_second(mut self, limit: u32) -> Self {
        self.requests_per_second = Some(limit);
        self
    }

    pub fn with_per_minute(mut self, limit: u32) -> Self {
        self.requests_per_minute = Some(limit);
        self
    }

    pub fn with_per_hour(mut self, limit: u32) -> Self {
        self.requests_per_hour = Some(limit);
        self
    }

    pub fn per_second(&self) -> u64 {
        resolve(self.requests_per_second)
    }

    pub fn per_minute(&self) -> u64 {
        resolve(self.requests_per_minute)
    }

    pub fn per_hour(&self) -> u64 {
        resolve(self.requests_per_hour)
    }

    /// Check that every configured limit admits at least one request
    pub fn validate(&self) -> Result<(), String> {
        debug!(?self, "QuotaConfig::validate: called");
        let limits = [
            ("requests-per-second", self.requests_per_second),
            ("requests-per-minute", self.requests_per_minute),
            ("requests-per-hour", self.requests_per_hour),
        ];
        for (name, limit) in limits {
            if limit == Some(0) {
                debug!(%name, "QuotaConfig::validate: zero limit");
                return Err(format!("{} must be greater than zero", name));
            }
        }
        Ok(())
    }
}

fn resolve(limit: Option<u32>) -> u64 {
    limit.map(u64::from).unwrap_or(UNBOUNDED)
}
