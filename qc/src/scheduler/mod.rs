//! Request scheduler
//!
//! Serializes outbound requests into a single FIFO delivery stream and
//! throttles it against the configured quotas. One drain loop runs per
//! scheduler at a time; it is started on demand and stops when the queue
//! empties.

mod config;
mod core;
mod queue;
pub mod simulate;

pub use config::{SchedulerConfig, SendStamp};
pub use self::core::Scheduler;
pub use queue::{Pending, QueueState, SchedulerError, SchedulerStats};
pub use simulate::{Dispatch, simulate, simulate_burst};
