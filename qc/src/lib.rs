//! QuotaClient - throttled client for rate-limited APIs
//!
//! Remote APIs often enforce request quotas per second, per minute and per
//! hour at the same time. QuotaClient funnels every outbound call through a
//! single FIFO queue and delays each one just long enough to stay under all
//! three quotas.
//!
//! # Core Concepts
//!
//! - **One delivery stream**: calls are dispatched one at a time, in the order
//!   they were queued
//! - **Two window strategies**: fixed windows aligned to the clock, or sliding
//!   windows measured back from now
//! - **Failures stay local**: a failed call settles only its own future
//!
//! # Modules
//!
//! - [`scheduler`] - FIFO queue and drain loop
//! - [`quota`] - Window accounting strategies
//! - [`transport`] - Transport trait and reqwest implementation
//! - [`client`] - `ApiClient` tying the scheduler to a transport
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod quota;
pub mod scheduler;
pub mod transport;

// Re-export commonly used types
pub use client::ApiClient;
pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use config::{Config, HttpConfig};
pub use error::ClientError;
pub use quota::{FixedWindow, HistoryRetention, QuotaConfig, SendTimeLog, SlidingWindow, StrategyKind, WindowStrategy};
pub use scheduler::{Pending, QueueState, Scheduler, SchedulerConfig, SchedulerError, SchedulerStats, SendStamp};
pub use transport::{ErrorCode, HttpClientError, HttpTransport, ResponseError, Transport};
