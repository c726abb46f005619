//! Offline dispatch timeline
//!
//! Replays the drain loop against a [`ManualClock`] with instantaneous
//! transport, so a quota/strategy combination can be inspected without
//! waiting in real time.

use tracing::debug;

use crate::clock::{Clock, ManualClock};
use crate::quota::{SendTimeLog, WindowStrategy};

use super::SendStamp;

/// One simulated dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// Position in submission order
    pub index: usize,
    /// When the request was submitted
    pub arrival: i64,
    /// When the request actually went out
    pub sent_at: i64,
    /// Time recorded in the send history
    pub stamped: i64,
    /// Seconds spent throttled
    pub waited: i64,
}

/// Simulate dispatching requests that arrive at the given (non-decreasing) times
pub fn simulate(strategy: &WindowStrategy, send_stamp: SendStamp, arrivals: &[i64]) -> Vec<Dispatch> {
    debug!(kind = %strategy.kind(), %send_stamp, count = arrivals.len(), "simulate: called");
    let clock = ManualClock::new(arrivals.first().copied().unwrap_or_default());
    let mut log = SendTimeLog::new();
    let mut next_available = 0;

    arrivals
        .iter()
        .enumerate()
        .map(|(index, &arrival)| {
            if arrival > clock.now_secs() {
                clock.set(arrival);
            }
            let now = clock.now_secs();
            let waited = (next_available - now).max(0);
            clock.advance(waited);

            let sent_at = clock.now_secs();
            let stamped = match send_stamp {
                SendStamp::BeforeWait => now,
                SendStamp::AfterWait => sent_at,
            };
            log.push_back(stamped);
            next_available = strategy.recompute(&mut log, sent_at);

            Dispatch {
                index,
                arrival,
                sent_at,
                stamped,
                waited,
            }
        })
        .collect()
}

/// Simulate `count` requests all submitted at `start`
pub fn simulate_burst(strategy: &WindowStrategy, send_stamp: SendStamp, start: i64, count: usize) -> Vec<Dispatch> {
    simulate(strategy, send_stamp, &vec![start; count])
}
