//! QuotaClient - throttled requests against rate-limited APIs
//!
//! CLI entry point for sending scheduled requests and previewing dispatch timelines.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use serde_json::Value;
use tracing::{debug, info, warn};

use quotaclient::cli::{Cli, Command, parse_params};
use quotaclient::clock::{Clock, SystemClock};
use quotaclient::config::Config;
use quotaclient::scheduler::{Scheduler, simulate_burst};
use quotaclient::{ApiClient, ClientError, QuotaConfig, WindowStrategy};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Can't log here until the subscriber is installed
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotaclient")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("quotaclient.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log level is needed before the full config load can report anything
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    cli.overrides.apply(&mut config);
    info!(quota = ?config.quota, scheduler = ?config.scheduler, "QuotaClient loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Get { url, params, repeat } => cmd_get(&config, &url, &params, repeat).await,
        Command::Post { url, body, repeat } => cmd_post(&config, &url, &body, repeat).await,
        Command::Simulate { count, start } => cmd_simulate(&config, count, start),
    }
}

async fn cmd_get(config: &Config, url: &str, params: &[String], repeat: usize) -> Result<()> {
    debug!(%url, ?params, repeat, "cmd_get: called");
    config.validate()?;
    let query = parse_params(params).map_err(|e| eyre!(e))?;
    let client = ApiClient::from_config(config)?;

    // Queue every request up front so they share the throttled stream
    let pending: Vec<_> = (0..repeat)
        .map(|_| client.schedule_get::<Value, Value>(url, Some(&query)))
        .collect();

    let mut results = Vec::with_capacity(pending.len());
    for call in pending {
        results.push(call.await);
    }
    report(client.scheduler(), results)
}

async fn cmd_post(config: &Config, url: &str, body: &str, repeat: usize) -> Result<()> {
    debug!(%url, repeat, "cmd_post: called");
    config.validate()?;
    let body: Value = serde_json::from_str(body).context("Request body is not valid JSON")?;
    let client = ApiClient::from_config(config)?;

    let pending: Vec<_> = (0..repeat)
        .map(|_| client.schedule_post::<Value, Value>(url, &body))
        .collect();

    let mut results = Vec::with_capacity(pending.len());
    for call in pending {
        results.push(call.await);
    }
    report(client.scheduler(), results)
}

/// Print each response, then a summary of the throttling that happened
fn report(scheduler: &Scheduler, results: Vec<Result<Value, ClientError>>) -> Result<()> {
    let total = results.len();
    let mut failed = 0;

    for result in results {
        match result {
            Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            Err(e) => {
                failed += 1;
                warn!(error = %e, "request failed");
                eprintln!("{} {}", "error:".red().bold(), e);
                for detail in e.errors() {
                    eprintln!("  {:?}: {}", detail.code, detail.message);
                }
            }
        }
    }

    let stats = scheduler.stats();
    eprintln!(
        "{} sent, {} throttled, {}s waited",
        stats.total_dispatched, stats.total_throttled, stats.total_wait_secs
    );

    if failed > 0 {
        return Err(eyre!("{} of {} requests failed", failed, total));
    }
    Ok(())
}

fn cmd_simulate(config: &Config, count: usize, start: Option<i64>) -> Result<()> {
    debug!(count, ?start, "cmd_simulate: called");
    config.quota.validate().map_err(|e| eyre!("Invalid quota: {}", e))?;

    let strategy = WindowStrategy::from_kind(config.scheduler.strategy, config.quota, config.scheduler.retention);
    let send_stamp = config.scheduler.send_stamp;
    let start = start.unwrap_or_else(|| SystemClock.now_secs());

    println!(
        "{} strategy, {} stamping, quota {}",
        strategy.kind().to_string().bold(),
        send_stamp,
        describe_quota(strategy.quota())
    );

    for dispatch in simulate_burst(&strategy, send_stamp, start, count) {
        let line = format!(
            "{:>5}  sent {}  (+{}s)",
            dispatch.index + 1,
            dispatch.sent_at,
            dispatch.sent_at - start
        );
        if dispatch.waited > 0 {
            println!("{}  {}", line, format!("waited {}s", dispatch.waited).yellow());
        } else {
            println!("{}", line);
        }
    }
    Ok(())
}

fn describe_quota(quota: &QuotaConfig) -> String {
    let limit = |value: Option<u32>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    format!(
        "{}/s {}/min {}/h",
        limit(quota.requests_per_second),
        limit(quota.requests_per_minute),
        limit(quota.requests_per_hour)
    )
}
