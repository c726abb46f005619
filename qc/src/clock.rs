//! Time sources for quota accounting
//!
//! All accounting is done in whole seconds since the Unix epoch.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::time::Instant;
use tracing::debug;

/// Supplies the current time in whole seconds since the epoch
///
/// Implementations must be monotonic non-decreasing; the send-time history
/// relies on it to stay ordered.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> i64;
}

/// Wall clock backed by chrono
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock anchored at an epoch second and advanced by tokio's timer
///
/// Follows paused and auto-advanced time in tests, so a throttling sleep
/// moves this clock forward by exactly the slept amount.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin_secs: i64,
    started: Instant,
}

impl TokioClock {
    pub fn starting_at(origin_secs: i64) -> Self {
        debug!(%origin_secs, "TokioClock::starting_at: called");
        Self {
            origin_secs,
            started: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now_secs(&self) -> i64 {
        self.origin_secs + self.started.elapsed().as_secs() as i64
    }
}

/// Clock that only moves when told to
///
/// Cloning shares the underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now_secs: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_secs)),
        }
    }

    pub fn set(&self, now_secs: i64) {
        self.now.store(now_secs, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
