//! Strategy selection

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FixedWindow, QuotaConfig, SendTimeLog, SlidingWindow};

/// Which accounting strategy to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Windows aligned to clock boundaries
    #[default]
    Fixed,
    /// Windows measured back from now
    Sliding,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Sliding => write!(f, "sliding"),
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "sliding" => Ok(Self::Sliding),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

/// Whether the fixed-window strategy discards history outside the current hour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryRetention {
    /// Drop entries older than the current clock-hour
    #[default]
    Prune,
    /// Keep every entry for the life of the scheduler
    Unbounded,
}

/// Accounting strategy injected into the scheduler
#[derive(Debug, Clone)]
pub enum WindowStrategy {
    Fixed(FixedWindow),
    Sliding(SlidingWindow),
}

impl WindowStrategy {
    pub fn fixed(quota: QuotaConfig) -> Self {
        Self::Fixed(FixedWindow::new(quota))
    }

    pub fn sliding(quota: QuotaConfig) -> Self {
        Self::Sliding(SlidingWindow::new(quota))
    }

    /// Build the strategy named by `kind`
    ///
    /// `retention` only applies to the fixed strategy; the sliding strategy
    /// always prunes.
    pub fn from_kind(kind: StrategyKind, quota: QuotaConfig, retention: HistoryRetention) -> Self {
        debug!(%kind, ?quota, ?retention, "WindowStrategy::from_kind: called");
        match kind {
            StrategyKind::Fixed => Self::Fixed(FixedWindow::new(quota).with_retention(retention)),
            StrategyKind::Sliding => Self::Sliding(SlidingWindow::new(quota)),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Fixed(_) => StrategyKind::Fixed,
            Self::Sliding(_) => StrategyKind::Sliding,
        }
    }

    pub fn quota(&self) -> &QuotaConfig {
        match self {
            Self::Fixed(w) => w.quota(),
            Self::Sliding(w) => w.quota(),
        }
    }

    /// Earliest time the next request may be sent
    ///
    /// Called right after a send has been appended to `log`. May prune `log`.
    pub fn recompute(&self, log: &mut SendTimeLog, now: i64) -> i64 {
        match self {
            Self::Fixed(w) => w.recompute(log, now),
            Self::Sliding(w) => w.recompute(log, now),
        }
    }
}
