//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::quota::StrategyKind;
use crate::scheduler::SendStamp;

/// QuotaClient - throttled requests against rate-limited APIs
#[derive(Parser)]
#[command(
    name = "qc",
    about = "Send requests to a rate-limited API without exceeding its quotas",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/quotaclient/logs/quotaclient.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    #[command(flatten)]
    pub overrides: QuotaOverrides,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Command-line overrides for the quota and scheduler sections of the config
#[derive(Debug, Default, Args)]
pub struct QuotaOverrides {
    /// Max requests per second
    #[arg(long, global = true)]
    pub rps: Option<u32>,

    /// Max requests per minute
    #[arg(long, global = true)]
    pub rpm: Option<u32>,

    /// Max requests per hour
    #[arg(long, global = true)]
    pub rph: Option<u32>,

    /// Window strategy (fixed, sliding)
    #[arg(long, global = true)]
    pub strategy: Option<StrategyKind>,

    /// Send time recorded for throttled requests (before-wait, after-wait)
    #[arg(long = "send-stamp", global = true)]
    pub send_stamp: Option<SendStamp>,
}

impl QuotaOverrides {
    /// Apply the overrides on top of a loaded config
    pub fn apply(&self, config: &mut Config) {
        debug!(?self, "QuotaOverrides::apply: called");
        if let Some(rps) = self.rps {
            config.quota.requests_per_second = Some(rps);
        }
        if let Some(rpm) = self.rpm {
            config.quota.requests_per_minute = Some(rpm);
        }
        if let Some(rph) = self.rph {
            config.quota.requests_per_hour = Some(rph);
        }
        if let Some(strategy) = self.strategy {
            config.scheduler.strategy = strategy;
        }
        if let Some(send_stamp) = self.send_stamp {
            config.scheduler.send_stamp = send_stamp;
        }
    }
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send GET requests through the scheduler
    Get {
        /// Request URL
        url: String,

        /// Query parameter as KEY=VALUE (repeat a key to send a list)
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Number of times to send the request
        #[arg(short = 'n', long, default_value = "1")]
        repeat: usize,
    },

    /// Send POST requests through the scheduler
    Post {
        /// Request URL
        url: String,

        /// JSON request body
        #[arg(short, long)]
        body: String,

        /// Number of times to send the request
        #[arg(short = 'n', long, default_value = "1")]
        repeat: usize,
    },

    /// Show when a burst of requests would be dispatched, without sending anything
    Simulate {
        /// Number of requests in the burst
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,

        /// Submission time in seconds since the epoch (default: now)
        #[arg(long)]
        start: Option<i64>,
    },
}

/// Turn `KEY=VALUE` arguments into a JSON object; repeated keys become lists
pub fn parse_params(params: &[String]) -> Result<Value, String> {
    debug!(?params, "parse_params: called");
    let mut map = Map::new();
    for param in params {
        let (key, value) = param
            .split_once('=')
            .ok_or_else(|| format!("Invalid parameter '{}', expected KEY=VALUE", param))?;
        if key.is_empty() {
            return Err(format!("Invalid parameter '{}', empty key", param));
        }

        let value = Value::String(value.to_string());
        match map.get_mut(key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.to_string(), value);
            }
        }
    }
    Ok(Value::Object(map))
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotaclient")
        .join("logs")
        .join("quotaclient.log")
}
