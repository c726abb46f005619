//! Scheduler configuration

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::quota::{HistoryRetention, StrategyKind};

/// Which clock reading is recorded as a request's send time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SendStamp {
    /// The time read before any throttling wait
    #[default]
    BeforeWait,
    /// The time read once the wait is over
    AfterWait,
}

impl std::fmt::Display for SendStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BeforeWait => write!(f, "before-wait"),
            Self::AfterWait => write!(f, "after-wait"),
        }
    }
}

impl std::str::FromStr for SendStamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "before-wait" => Ok(Self::BeforeWait),
            "after-wait" => Ok(Self::AfterWait),
            _ => Err(format!("Unknown send stamp: {}", s)),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Window accounting strategy
    pub strategy: StrategyKind,

    /// History retention for the fixed strategy
    pub retention: HistoryRetention,

    /// Which time is recorded for a throttled request
    #[serde(rename = "send-stamp")]
    pub send_stamp: SendStamp,
}

impl SchedulerConfig {
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        debug!(%strategy, "SchedulerConfig::with_strategy: called");
        self.strategy = strategy;
        self
    }

    pub fn with_send_stamp(mut self, send_stamp: SendStamp) -> Self {
        debug!(%send_stamp, "SchedulerConfig::with_send_stamp: called");
        self.send_stamp = send_stamp;
        self
    }
}
