//! Sliding-window accounting
//!
//! Quotas are counted over the last 1, 60 and 3600 seconds measured back
//! from now. No interval of those lengths ever holds more sends than its
//! limit, as long as send times are recorded when the send happens.

use tracing::debug;

use super::{QuotaConfig, SEC, SEC_IN_HOUR, SEC_IN_MIN, SendTimeLog};

/// Sliding-window strategy
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    quota: QuotaConfig,
}

impl SlidingWindow {
    pub fn new(quota: QuotaConfig) -> Self {
        Self { quota }
    }

    pub fn quota(&self) -> &QuotaConfig {
        &self.quota
    }

    /// Earliest send time permitted by the trailing windows
    ///
    /// Entries older than an hour are dropped from `log`.
    pub fn recompute(&self, log: &mut SendTimeLog, now: i64) -> i64 {
        log.retain(|&t| now - t <= SEC_IN_HOUR);

        let mut last_second = 0usize;
        let mut last_minute = 0usize;
        let mut last_hour = 0usize;
        for &t in log.iter() {
            let age = now - t;
            if age < SEC {
                last_second += 1;
            }
            if age < SEC_IN_MIN {
                last_minute += 1;
            }
            // An entry exactly an hour old is kept but has left the window
            if age < SEC_IN_HOUR {
                last_hour += 1;
            }
        }

        let mut next = now;
        if last_second as u64 >= self.quota.per_second() {
            debug!(%last_second, %now, "SlidingWindow::recompute: second quota reached");
            if let Some(&newest) = log.back() {
                next = next.max(newest + SEC);
            }
        }
        if last_minute as u64 >= self.quota.per_minute() {
            debug!(%last_minute, %now, "SlidingWindow::recompute: minute quota reached");
            if let Some(&oldest) = oldest_counted(log, last_minute) {
                next = next.max(oldest + SEC_IN_MIN);
            }
        }
        if last_hour as u64 >= self.quota.per_hour() {
            debug!(%last_hour, %now, "SlidingWindow::recompute: hour quota reached");
            if let Some(&oldest) = oldest_counted(log, last_hour) {
                next = next.max(oldest + SEC_IN_HOUR);
            }
        }
        next
    }
}

/// Oldest of the `counted` most recent entries
fn oldest_counted(log: &SendTimeLog, counted: usize) -> Option<&i64> {
    log.len().checked_sub(counted).and_then(|idx| log.get(idx))
}
