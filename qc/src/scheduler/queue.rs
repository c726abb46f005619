//! Queue types for the scheduler

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::oneshot;

/// Deferred work: runs the caller's operation and hands its result back
pub(super) type TaskFn = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// A queued unit of work
pub(super) struct PendingTask {
    /// Position in enqueue order, for log correlation only
    pub seq: u64,
    pub run: TaskFn,
}

/// Errors from waiting on a scheduled task
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduled task {seq} ended without producing a result")]
    Abandoned { seq: u64 },
}

/// Result of a scheduled task, available once the task has been dispatched
///
/// Dropping a `Pending` does not withdraw the task; it still runs and its
/// result is discarded.
#[derive(Debug)]
pub struct Pending<R> {
    seq: u64,
    rx: oneshot::Receiver<R>,
}

impl<R> Pending<R> {
    pub(super) fn new(seq: u64, rx: oneshot::Receiver<R>) -> Self {
        Self { seq, rx }
    }

    /// Position of the task in enqueue order
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl<R> Future for Pending<R> {
    type Output = Result<R, SchedulerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let seq = self.seq;
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.map_err(|_| SchedulerError::Abandoned { seq }))
    }
}

/// Statistics for the scheduler
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchedulerStats {
    pub total_enqueued: u64,
    pub total_dispatched: u64,
    pub total_throttled: u64,
    pub total_wait_secs: u64,
    pub peak_queue_depth: usize,
}

/// Point-in-time view of the scheduler
#[derive(Debug, Clone)]
pub struct QueueState {
    pub queued: usize,
    pub draining: bool,
    pub next_available: i64,
    pub history_len: usize,
    pub stats: SchedulerStats,
}
