//! Quota accounting
//!
//! Tracks per-second, per-minute and per-hour request quotas against the
//! history of send times. Two accounting strategies decide when the next
//! request may go out:
//!
//! - **Fixed**: windows aligned to clock boundaries (`:00` of each minute/hour)
//! - **Sliding**: windows measured back from "now"

use std::collections::VecDeque;

mod config;
mod fixed;
mod sliding;
mod strategy;

pub use config::QuotaConfig;
pub use fixed::FixedWindow;
pub use sliding::SlidingWindow;
pub use strategy::{HistoryRetention, StrategyKind, WindowStrategy};

/// Send times in seconds since the epoch, oldest first
pub type SendTimeLog = VecDeque<i64>;

pub const SEC: i64 = 1;
pub const SEC_IN_MIN: i64 = 60;
pub const SEC_IN_HOUR: i64 = 3600;

/// Limit used for a quota that was not configured
pub const UNBOUNDED: u64 = u64::MAX;
