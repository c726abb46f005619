//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ClientError;
use crate::quota::QuotaConfig;
use crate::scheduler::SchedulerConfig;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// HTTP transport configuration
    pub http: HttpConfig,

    /// Request quotas enforced by the remote API
    pub quota: QuotaConfig,

    /// Scheduler behaviour
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key environment variable is set and that every
    /// configured quota admits at least one request. Call this early in
    /// startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        self.http.get_api_key()?;
        self.quota.validate().map_err(|e| eyre::eyre!("Invalid quota: {}", e))?;
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .quotaclient.yml
        let local_config = PathBuf::from(".quotaclient.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/quotaclient/quotaclient.yml
        if let Some(user_config) = user_config_path() {
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => [Some(PathBuf::from(".quotaclient.yml")), user_config_path()]
                .into_iter()
                .flatten()
                .collect(),
        };

        candidates
            .into_iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("quotaclient").join("quotaclient.yml"))
}

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            api_key_env: "QUOTA_API_KEY".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl HttpConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String, ClientError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(ClientError::MissingApiKey(self.api_key_env.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::{HistoryRetention, StrategyKind};
    use crate::scheduler::SendStamp;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.log_level, None);
        assert_eq!(config.http.api_key_env, "QUOTA_API_KEY");
        assert_eq!(config.http.timeout_ms, 30_000);
        assert_eq!(config.quota, QuotaConfig::default());
        assert_eq!(config.scheduler.strategy, StrategyKind::Fixed);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug

http:
  api-key-env: ASTRO_API_KEY
  timeout-ms: 5000

quota:
  requests-per-second: 2
  requests-per-minute: 60
  requests-per-hour: 1000

scheduler:
  strategy: sliding
  retention: unbounded
  send-stamp: after-wait
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.http.api_key_env, "ASTRO_API_KEY");
        assert_eq!(config.http.timeout_ms, 5000);
        assert_eq!(config.quota.per_second(), 2);
        assert_eq!(config.quota.per_minute(), 60);
        assert_eq!(config.quota.per_hour(), 1000);
        assert_eq!(config.scheduler.strategy, StrategyKind::Sliding);
        assert_eq!(config.scheduler.retention, HistoryRetention::Unbounded);
        assert_eq!(config.scheduler.send_stamp, SendStamp::AfterWait);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
quota:
  requests-per-minute: 30
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.quota.requests_per_minute, Some(30));

        // Defaults for unspecified
        assert_eq!(config.quota.requests_per_second, None);
        assert_eq!(config.http.api_key_env, "QUOTA_API_KEY");
        assert_eq!(config.scheduler.send_stamp, SendStamp::BeforeWait);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quotaclient.yml");
        fs::write(&path, "log-level: warn\nquota:\n  requests-per-second: 5\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.quota.per_second(), 5);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.yml");

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
        assert_eq!(Config::load_log_level(Some(&path)), None);
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yml");
        fs::write(&path, "quota: [not, a, map]\n").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    #[serial]
    fn test_validate_requires_api_key() {
        let config = Config {
            http: HttpConfig {
                api_key_env: "QUOTACLIENT_TEST_KEY".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        unsafe { std::env::remove_var("QUOTACLIENT_TEST_KEY") };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("QUOTACLIENT_TEST_KEY"));

        unsafe { std::env::set_var("QUOTACLIENT_TEST_KEY", "k-123") };
        assert!(config.validate().is_ok());
        assert_eq!(config.http.get_api_key().unwrap(), "k-123");

        unsafe { std::env::remove_var("QUOTACLIENT_TEST_KEY") };
    }

    #[test]
    #[serial]
    fn test_validate_rejects_zero_quota() {
        unsafe { std::env::set_var("QUOTACLIENT_ZERO_KEY", "k") };
        let config = Config {
            http: HttpConfig {
                api_key_env: "QUOTACLIENT_ZERO_KEY".to_string(),
                ..Default::default()
            },
            quota: QuotaConfig::default().with_per_hour(0),
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("requests-per-hour"));
        unsafe { std::env::remove_var("QUOTACLIENT_ZERO_KEY") };
    }
}
