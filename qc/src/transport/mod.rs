//! Transport layer
//!
//! The scheduler never talks to the network itself; scheduled work calls a
//! [`Transport`]. [`HttpTransport`] is the reqwest-backed implementation.

pub mod client;
mod error;
mod http;
mod query;

pub use client::Transport;
pub use error::{ErrorCode, HttpClientError, ResponseError};
pub use http::{API_KEY_HEADER, HttpTransport};
pub use query::query_pairs;
