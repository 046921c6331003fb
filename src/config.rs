//! Configuration types for price-feeder

use crate::cache::SnapshotConfig;
use crate::decision::{DecisionConfig, Dispatch};
use crate::http::RetryConfig;
use crate::scheduler::{FeederOptions, Schedule};
use crate::telemetry::LogFormat;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feeder: FeederConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub destination: DestinationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retry: RetryBackoffConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// How fetch and push cycles are scheduled
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    /// Independent fetch and push timers
    #[default]
    Split,
    /// One timer running fetch then push
    Combined,
}

/// Feeder behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct FeederConfig {
    /// Symbols to relay
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    #[serde(default)]
    pub mode: ScheduleMode,

    /// Seconds between fetch cycles (also the combined cycle interval)
    #[serde(default = "default_interval")]
    pub fetch_interval_secs: u64,

    /// Seconds between push cycles in split mode
    #[serde(default = "default_interval")]
    pub push_interval_secs: u64,

    /// Seconds to wait between the price request and its retrieval
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,

    /// Maximum seconds since the last push before a refresh is due
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: i64,

    /// Relative price change that forces an immediate push
    #[serde(default = "default_diff_threshold")]
    pub diff_threshold: f64,

    /// Read pushed symbols back from the destination and compare
    #[serde(default)]
    pub enable_recheck: bool,

    /// Seed never-seen symbols from the destination's stored value
    #[serde(default)]
    pub seed_from_destination: bool,

    /// Dispatch for a symbol seen for the first time
    #[serde(default)]
    pub first_sight: Dispatch,

    /// Dispatch once `max_delay_secs` has elapsed
    #[serde(default)]
    pub stale: Dispatch,
}

fn default_symbols() -> Vec<String> {
    vec!["BTC".to_string(), "ETH".to_string()]
}
fn default_interval() -> u64 {
    60
}
fn default_wait_secs() -> u64 {
    5
}
fn default_max_delay_secs() -> i64 {
    3600
}
fn default_diff_threshold() -> f64 {
    0.1
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            mode: ScheduleMode::Split,
            fetch_interval_secs: default_interval(),
            push_interval_secs: default_interval(),
            wait_secs: default_wait_secs(),
            max_delay_secs: default_max_delay_secs(),
            diff_threshold: default_diff_threshold(),
            enable_recheck: false,
            seed_from_destination: false,
            first_sight: Dispatch::Batch,
            stale: Dispatch::Batch,
        }
    }
}

impl FeederConfig {
    pub fn decision(&self) -> DecisionConfig {
        DecisionConfig {
            max_delay_secs: self.max_delay_secs,
            diff_threshold: self.diff_threshold,
            first_sight: self.first_sight,
            stale: self.stale,
        }
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs)
    }

    pub fn push_interval(&self) -> Duration {
        Duration::from_secs(self.push_interval_secs)
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            mode: self.mode,
            fetch_interval: self.fetch_interval(),
            push_interval: self.push_interval(),
        }
    }

    pub fn options(&self) -> FeederOptions {
        FeederOptions {
            symbols: self.symbols.clone(),
            enable_recheck: self.enable_recheck,
            seed_from_destination: self.seed_from_destination,
        }
    }
}

/// Upstream source endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_request_url")]
    pub request_url: String,
    #[serde(default = "default_request_url")]
    pub retrieve_url: String,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_request_url() -> String {
    "http://localhost:8080/request".to_string()
}
fn default_retry_count() -> u32 {
    1
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            request_url: default_request_url(),
            retrieve_url: default_request_url(),
            retry_count: default_retry_count(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Downstream destination endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationConfig {
    #[serde(default = "default_update_url")]
    pub update_url: String,
    #[serde(default = "default_read_url")]
    pub read_url: String,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Lifetime of last-known destination values (0 = disabled)
    #[serde(default)]
    pub known_value_ttl_secs: u64,
}

fn default_update_url() -> String {
    "http://localhost:8081/update".to_string()
}
fn default_read_url() -> String {
    "http://localhost:8081/get_price".to_string()
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            update_url: default_update_url(),
            read_url: default_read_url(),
            retry_count: default_retry_count(),
            timeout_secs: default_timeout_secs(),
            known_value_ttl_secs: 0,
        }
    }
}

impl DestinationConfig {
    pub fn known_value_ttl(&self) -> Duration {
        Duration::from_secs(self.known_value_ttl_secs)
    }
}

/// Cache snapshot persistence
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    /// Snapshots older than this are ignored at startup
    #[serde(default = "default_lifetime_secs")]
    pub lifetime_secs: u64,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./data/price_cache.json")
}
fn default_lifetime_secs() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            lifetime_secs: default_lifetime_secs(),
        }
    }
}

impl CacheConfig {
    pub fn snapshot(&self) -> SnapshotConfig {
        SnapshotConfig::new(&self.snapshot_path, Duration::from_secs(self.lifetime_secs))
    }
}

/// Delay between retries of a remote call
#[derive(Debug, Clone, Deserialize)]
pub struct RetryBackoffConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_initial_delay_ms() -> u64 {
    1000
}
fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for RetryBackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryBackoffConfig {
    /// Retry policy for an endpoint with the given retry count and timeout
    pub fn policy(&self, retry_count: u32, timeout_secs: u64) -> RetryConfig {
        RetryConfig::default()
            .retries(retry_count)
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .timeout(Duration::from_secs(timeout_secs))
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this port when set
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings the feeder cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        let feeder = &self.feeder;

        if feeder.symbols.is_empty() {
            anyhow::bail!("feeder.symbols must not be empty");
        }
        if let Some(bad) = feeder.symbols.iter().find(|s| s.trim().is_empty()) {
            anyhow::bail!("feeder.symbols contains an empty symbol: {:?}", bad);
        }
        if feeder.fetch_interval_secs == 0 {
            anyhow::bail!("feeder.fetch_interval_secs must be positive");
        }
        if feeder.mode == ScheduleMode::Split && feeder.push_interval_secs == 0 {
            anyhow::bail!("feeder.push_interval_secs must be positive");
        }
        if feeder.max_delay_secs <= 0 {
            anyhow::bail!("feeder.max_delay_secs must be positive");
        }
        if !feeder.diff_threshold.is_finite() || feeder.diff_threshold < 0.0 {
            anyhow::bail!(
                "feeder.diff_threshold must be a non-negative number, got {}",
                feeder.diff_threshold
            );
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            anyhow::bail!("retry.initial_delay_ms must not exceed retry.max_delay_ms");
        }

        Ok(())
    }
}
