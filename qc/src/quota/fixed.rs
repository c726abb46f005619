//! Fixed-window accounting
//!
//! Quotas are counted per calendar-aligned window: the current second, the
//! current clock-minute and the current clock-hour. Windows realign on the
//! clock boundary regardless of when the first request in them was sent, so
//! two requests a second apart may land in different minute windows.

use tracing::debug;

use super::{HistoryRetention, QuotaConfig, SEC, SEC_IN_HOUR, SEC_IN_MIN, SendTimeLog};

/// Fixed-window strategy
#[derive(Debug, Clone)]
pub struct FixedWindow {
    quota: QuotaConfig,
    retention: HistoryRetention,
}

impl FixedWindow {
    pub fn new(quota: QuotaConfig) -> Self {
        Self {
            quota,
            retention: HistoryRetention::default(),
        }
    }

    pub fn with_retention(mut self, retention: HistoryRetention) -> Self {
        self.retention = retention;
        self
    }

    pub fn quota(&self) -> &QuotaConfig {
        &self.quota
    }

    pub fn retention(&self) -> HistoryRetention {
        self.retention
    }

    /// Earliest send time permitted by the current aligned windows
    pub fn recompute(&self, log: &mut SendTimeLog, now: i64) -> i64 {
        let minute_start = now.div_euclid(SEC_IN_MIN) * SEC_IN_MIN;
        let hour_start = now.div_euclid(SEC_IN_HOUR) * SEC_IN_HOUR;

        if self.retention == HistoryRetention::Prune {
            while log.front().is_some_and(|&t| t < hour_start) {
                log.pop_front();
            }
        }

        let mut this_second = 0u64;
        let mut this_minute = 0u64;
        let mut this_hour = 0u64;
        for &t in log.iter() {
            if t >= hour_start && t < hour_start + SEC_IN_HOUR {
                this_hour += 1;
            }
            if t >= minute_start && t < minute_start + SEC_IN_MIN {
                this_minute += 1;
            }
            if t == now {
                this_second += 1;
            }
        }

        let mut next = now;
        if this_second >= self.quota.per_second() {
            debug!(%this_second, %now, "FixedWindow::recompute: second quota reached");
            next = next.max(now + SEC);
        }
        if this_minute >= self.quota.per_minute() {
            debug!(%this_minute, %minute_start, "FixedWindow::recompute: minute quota reached");
            next = next.max(minute_start + SEC_IN_MIN);
        }
        if this_hour >= self.quota.per_hour() {
            debug!(%this_hour, %hour_start, "FixedWindow::recompute: hour quota reached");
            next = next.max(hour_start + SEC_IN_HOUR);
        }
        next
    }
}
