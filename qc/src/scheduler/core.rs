//! Scheduler implementation

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::quota::{QuotaConfig, SendTimeLog, WindowStrategy};

use super::config::{SchedulerConfig, SendStamp};
use super::queue::{Pending, PendingTask, QueueState, SchedulerStats, TaskFn};

/// Internal state protected by mutex
struct SchedulerInner {
    /// Tasks waiting to be dispatched, oldest first
    queue: VecDeque<PendingTask>,

    /// True while a drain loop is running
    draining: bool,

    /// Send times of dispatched requests
    history: SendTimeLog,

    /// Earliest time the next request may be sent
    next_available: i64,

    /// Sequence number for the next enqueued task
    next_seq: u64,

    /// Statistics
    stats: SchedulerStats,
}

struct Shared {
    strategy: WindowStrategy,
    send_stamp: SendStamp,
    clock: Arc<dyn Clock>,
    inner: Mutex<SchedulerInner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SchedulerInner> {
        // Nothing panics while the lock is held, so a poisoned guard is still consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The Scheduler serializes requests into a single delivery stream and
/// delays each one just enough to respect the configured quotas.
///
/// Cloning gives another handle to the same queue.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    /// Create a scheduler on the system clock
    pub fn new(quota: QuotaConfig, config: SchedulerConfig) -> Self {
        debug!(?quota, ?config, "Scheduler::new: called");
        let strategy = WindowStrategy::from_kind(config.strategy, quota, config.retention);
        Self::with_parts(strategy, config.send_stamp, Arc::new(SystemClock))
    }

    /// Create a scheduler from an explicit strategy and clock
    pub fn with_parts(strategy: WindowStrategy, send_stamp: SendStamp, clock: Arc<dyn Clock>) -> Self {
        debug!(kind = %strategy.kind(), %send_stamp, "Scheduler::with_parts: called");
        Self {
            shared: Arc::new(Shared {
                strategy,
                send_stamp,
                clock,
                inner: Mutex::new(SchedulerInner {
                    queue: VecDeque::new(),
                    draining: false,
                    history: SendTimeLog::new(),
                    next_available: 0,
                    next_seq: 0,
                    stats: SchedulerStats::default(),
                }),
            }),
        }
    }

    /// Queue an operation for dispatch
    ///
    /// Returns immediately. The operation runs once, after every task queued
    /// before it, at the first moment the quotas allow. The returned future
    /// yields whatever the operation produced. Must be called from within a
    /// tokio runtime.
    pub fn enqueue<F, Fut, R>(&self, op: F) -> Pending<R>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let run: TaskFn = Box::new(move || {
            async move {
                let out = op().await;
                // Receiver gone means the caller stopped waiting
                let _ = tx.send(out);
            }
            .boxed()
        });

        let (seq, start_drain) = {
            let mut inner = self.shared.lock();
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.queue.push_back(PendingTask { seq, run });
            inner.stats.total_enqueued += 1;
            inner.stats.peak_queue_depth = inner.stats.peak_queue_depth.max(inner.queue.len());

            let start_drain = !inner.draining;
            inner.draining = true;
            (seq, start_drain)
        };

        if start_drain {
            debug!(%seq, "Scheduler::enqueue: starting drain loop");
            tokio::spawn(drain(Arc::clone(&self.shared)));
        } else {
            debug!(%seq, "Scheduler::enqueue: appended to active drain loop");
        }

        Pending::new(seq, rx)
    }

    /// Earliest time the next request may be sent
    pub fn next_available(&self) -> i64 {
        self.shared.lock().next_available
    }

    /// Copy of the recorded send times
    pub fn history(&self) -> Vec<i64> {
        self.shared.lock().history.iter().copied().collect()
    }

    pub fn strategy(&self) -> &WindowStrategy {
        &self.shared.strategy
    }

    /// Get current queue state
    pub fn queue_state(&self) -> QueueState {
        let inner = self.shared.lock();
        QueueState {
            queued: inner.queue.len(),
            draining: inner.draining,
            next_available: inner.next_available,
            history_len: inner.history.len(),
            stats: inner.stats.clone(),
        }
    }

    /// Get the scheduler statistics
    pub fn stats(&self) -> SchedulerStats {
        self.shared.lock().stats.clone()
    }
}

/// Dispatch queued tasks one at a time until the queue is empty
async fn drain(shared: Arc<Shared>) {
    debug!("drain: started");
    loop {
        let (task, now, wait) = {
            let mut inner = shared.lock();
            let Some(task) = inner.queue.pop_front() else {
                inner.draining = false;
                debug!("drain: queue empty, stopping");
                return;
            };
            let now = shared.clock.now_secs();
            let wait = inner.next_available - now;
            (task, now, wait)
        };

        if wait > 0 {
            warn!(seq = task.seq, wait_secs = wait, "Exceeded request limit. Waiting {} sec", wait);
            tokio::time::sleep(Duration::from_secs(wait as u64)).await;
        }

        {
            let mut inner = shared.lock();
            let sent_at = shared.clock.now_secs();
            let stamp = match shared.send_stamp {
                SendStamp::BeforeWait => now,
                SendStamp::AfterWait => sent_at,
            };

            let SchedulerInner {
                history,
                next_available,
                stats,
                ..
            } = &mut *inner;
            history.push_back(stamp);
            *next_available = shared.strategy.recompute(history, sent_at);

            stats.total_dispatched += 1;
            if wait > 0 {
                stats.total_throttled += 1;
                stats.total_wait_secs += wait as u64;
            }
            debug!(seq = task.seq, %stamp, next_available = *next_available, "drain: dispatching");
        }

        // A failing task settles its own future; a panicking one must not take the loop down
        if AssertUnwindSafe((task.run)()).catch_unwind().await.is_err() {
            warn!(seq = task.seq, "drain: task panicked, its caller sees an abandoned result");
        }
    }
}
