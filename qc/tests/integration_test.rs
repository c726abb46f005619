//! Integration tests for QuotaClient
//!
//! These tests drive the public API end to end: client, scheduler, window
//! strategies and the `qc` binary.

use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use async_trait::async_trait;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

use quotaclient::{
    ApiClient, Clock, ErrorCode, HttpClientError, QuotaConfig, ResponseError, Scheduler, SendStamp, TokioClock,
    Transport, WindowStrategy,
};

// =============================================================================
// Test transport
// =============================================================================

/// Transport that records when each call reached the wire
struct RecordingTransport {
    clock: TokioClock,
    sent: Mutex<Vec<(String, i64)>>,
    fail_urls: Vec<String>,
}

impl RecordingTransport {
    fn new(clock: TokioClock) -> Self {
        Self {
            clock,
            sent: Mutex::new(Vec::new()),
            fail_urls: Vec::new(),
        }
    }

    fn failing_on(mut self, url: &str) -> Self {
        self.fail_urls.push(url.to_string());
        self
    }

    fn sent_times(&self) -> Vec<i64> {
        self.sent.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    fn sent_urls(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    fn record(&self, method: &str, url: &str) -> Result<Value, HttpClientError> {
        let now = self.clock.now_secs();
        self.sent.lock().unwrap().push((url.to_string(), now));
        if self.fail_urls.iter().any(|u| u == url) {
            return Err(HttpClientError::new(
                method,
                url,
                vec![ResponseError::new(ErrorCode::IncorrectRequest, "bad parameter")],
            ));
        }
        Ok(json!({"url": url, "at": now}))
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get(&self, url: &str, _query: Option<&Value>) -> Result<Value, HttpClientError> {
        self.record("GET", url)
    }

    async fn post(&self, url: &str, _body: &Value) -> Result<Value, HttpClientError> {
        self.record("POST", url)
    }
}

fn setup(strategy: WindowStrategy, send_stamp: SendStamp) -> (ApiClient, Arc<RecordingTransport>) {
    setup_with(strategy, send_stamp, |t| t)
}

fn setup_with(
    strategy: WindowStrategy,
    send_stamp: SendStamp,
    customize: impl FnOnce(RecordingTransport) -> RecordingTransport,
) -> (ApiClient, Arc<RecordingTransport>) {
    let clock = TokioClock::starting_at(1_000);
    let transport = Arc::new(customize(RecordingTransport::new(clock.clone())));
    let scheduler = Scheduler::with_parts(strategy, send_stamp, Arc::new(clock));
    let client = ApiClient::new(Arc::clone(&transport) as Arc<dyn Transport>, scheduler);
    (client, transport)
}

async fn burst(client: &ApiClient, count: usize) -> Vec<Value> {
    let pending: Vec<_> = (0..count)
        .map(|i| client.schedule_get::<Value, Value>(&format!("/r{}", i), None))
        .collect();
    let mut results = Vec::new();
    for p in pending {
        results.push(p.await.expect("request should succeed"));
    }
    results
}

// =============================================================================
// Throttling Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_sliding_minute_quota_end_to_end() {
    let quota = QuotaConfig::default().with_per_minute(2);
    let (client, transport) = setup(WindowStrategy::sliding(quota), SendStamp::AfterWait);

    burst(&client, 5).await;

    assert_eq!(transport.sent_times(), vec![1_000, 1_000, 1_060, 1_060, 1_120]);
    let stats = client.scheduler().stats();
    assert_eq!(stats.total_dispatched, 5);
    assert_eq!(stats.total_throttled, 2);
    assert_eq!(stats.total_wait_secs, 120);
}

#[tokio::test(start_paused = true)]
async fn test_fixed_minute_quota_end_to_end() {
    let quota = QuotaConfig::default().with_per_minute(2);
    let (client, transport) = setup(WindowStrategy::fixed(quota), SendStamp::AfterWait);

    burst(&client, 5).await;

    // 1000 lies in the minute starting at 960
    assert_eq!(transport.sent_times(), vec![1_000, 1_000, 1_020, 1_020, 1_080]);
}

#[tokio::test(start_paused = true)]
async fn test_combined_quotas_respect_each_window() {
    let quota = QuotaConfig::default().with_per_second(2).with_per_minute(5);
    let (client, transport) = setup(WindowStrategy::sliding(quota), SendStamp::AfterWait);

    burst(&client, 12).await;

    let times = transport.sent_times();
    assert_eq!(times.len(), 12);
    for (i, &t) in times.iter().enumerate() {
        let in_second = times[..=i].iter().filter(|&&s| t - s < 1).count();
        let in_minute = times[..=i].iter().filter(|&&s| t - s < 60).count();
        assert!(in_second <= 2, "second quota exceeded at {}: {:?}", t, times);
        assert!(in_minute <= 5, "minute quota exceeded at {}: {:?}", t, times);
    }
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_quota_never_waits() {
    let (client, transport) = setup(WindowStrategy::fixed(QuotaConfig::unbounded()), SendStamp::BeforeWait);

    burst(&client, 50).await;

    assert!(transport.sent_times().iter().all(|&t| t == 1_000));
    assert_eq!(client.scheduler().stats().total_throttled, 0);
}

// =============================================================================
// Ordering and Failure Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_mixed_get_and_post_share_one_queue() {
    let quota = QuotaConfig::default().with_per_second(1);
    let (client, transport) = setup(WindowStrategy::fixed(quota), SendStamp::AfterWait);

    let a = client.schedule_get::<Value, Value>("/a", None);
    let b = client.schedule_post::<Value, Value>("/b", &json!({"x": 1}));
    let c = client.schedule_get::<Value, Value>("/c", None);

    let c = c.await.unwrap();
    let b = b.await.unwrap();
    let a = a.await.unwrap();

    assert_eq!(transport.sent_urls(), vec!["/a", "/b", "/c"]);
    assert_eq!(a["at"], 1_000);
    assert_eq!(b["at"], 1_001);
    assert_eq!(c["at"], 1_002);
}

#[tokio::test(start_paused = true)]
async fn test_failed_request_does_not_stop_the_queue() {
    let quota = QuotaConfig::default().with_per_second(1);
    let (client, transport) = setup_with(WindowStrategy::sliding(quota), SendStamp::AfterWait, |t| {
        t.failing_on("/bad")
    });

    let first = client.schedule_get::<Value, Value>("/ok1", None);
    let bad = client.schedule_get::<Value, Value>("/bad", None);
    let last = client.schedule_get::<Value, Value>("/ok2", None);

    assert!(first.await.is_ok());
    let err = bad.await.unwrap_err();
    assert_eq!(err.errors()[0].code, ErrorCode::IncorrectRequest);
    assert!(!err.is_connection_error());
    assert!(last.await.is_ok());

    // The failed call still consumed a slot
    assert_eq!(transport.sent_times(), vec![1_000, 1_001, 1_002]);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_each_get_exactly_one_result() {
    let quota = QuotaConfig::default().with_per_second(3);
    let (client, transport) = setup(WindowStrategy::sliding(quota), SendStamp::AfterWait);

    let handles: Vec<_> = (0..30)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.schedule_get::<Value, Value>(&format!("/c{}", i), None).await })
        })
        .collect();

    let mut urls = Vec::new();
    for handle in handles {
        let value = handle.await.unwrap().unwrap();
        urls.push(value["url"].as_str().unwrap().to_string());
    }

    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), 30);
    assert_eq!(transport.sent_times().len(), 30);
    assert_eq!(client.scheduler().queue_state().queued, 0);
}

// =============================================================================
// CLI Tests
// =============================================================================

fn qc(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("qc").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("NO_COLOR", "1")
        .env_remove("QUOTA_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    qc(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("--rps"));
}

#[test]
fn test_cli_simulate_per_second_burst() {
    let home = TempDir::new().unwrap();
    qc(&home)
        .args(["simulate", "--count", "3", "--rps", "2", "--start", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sent 100"))
        .stdout(predicate::str::contains("sent 101"))
        .stdout(predicate::str::contains("waited 1s"));
}

#[test]
fn test_cli_simulate_strategies_differ_at_minute_boundary() {
    let home = TempDir::new().unwrap();
    qc(&home)
        .args(["simulate", "-n", "2", "--rpm", "1", "--start", "59", "--strategy", "fixed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sent 60"));

    qc(&home)
        .args(["simulate", "-n", "2", "--rpm", "1", "--start", "59", "--strategy", "sliding"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sent 119"));
}

#[test]
fn test_cli_simulate_reads_local_config() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join(".quotaclient.yml"),
        "quota:\n  requests-per-second: 1\nscheduler:\n  strategy: sliding\n",
    )
    .unwrap();

    qc(&home)
        .args(["simulate", "-n", "2", "--start", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sliding"))
        .stdout(predicate::str::contains("sent 501"));
}

#[test]
fn test_cli_simulate_rejects_zero_quota() {
    let home = TempDir::new().unwrap();
    qc(&home)
        .args(["simulate", "--rps", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid quota"));
}

#[test]
fn test_cli_get_without_api_key_fails() {
    let home = TempDir::new().unwrap();
    qc(&home)
        .args(["get", "http://127.0.0.1:9/daily"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("QUOTA_API_KEY"));
}

#[test]
fn test_cli_post_rejects_invalid_json() {
    let home = TempDir::new().unwrap();
    qc(&home)
        .env("QUOTA_API_KEY", "k")
        .args(["post", "http://127.0.0.1:9/chart", "--body", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}
