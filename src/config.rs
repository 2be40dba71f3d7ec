//! Configuration types for market-indices

use crate::quote::{ChangeBasis, TrackedIndex};
use crate::refresher::RefreshConfig;
use crate::source::{YahooConfig, YAHOO_API_URL};
use crate::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "PORT";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default = "default_indices")]
    pub indices: Vec<TrackedIndex>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Background refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSettings {
    /// Seconds between refresh cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Per-fetch timeout in seconds (0 disables the timeout)
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Snapshots older than this are flagged stale
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,

    /// Upper bound for the delay after repeated failures
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// How long shutdown waits for an in-flight cycle
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,

    /// Reference price for percent change
    #[serde(default)]
    pub change_basis: ChangeBasis,
}

/// Quote provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Upstream quote provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Yahoo,
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; disabled when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

/// Invalid configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No indices configured")]
    NoIndices,
    #[error("Duplicate index name: {0}")]
    DuplicateName(String),
    #[error("Duplicate index symbol: {0}")]
    DuplicateSymbol(String),
    #[error("refresh.{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_interval_secs() -> u64 {
    120
}
fn default_fetch_timeout_secs() -> u64 {
    20
}
fn default_max_age_secs() -> u64 {
    600
}
fn default_max_backoff_secs() -> u64 {
    900
}
fn default_stop_timeout_secs() -> u64 {
    5
}
fn default_base_url() -> String {
    YAHOO_API_URL.to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    YahooConfig::default().user_agent
}
fn default_log_level() -> String {
    "info".to_string()
}

/// The indices tracked when none are configured
pub fn default_indices() -> Vec<TrackedIndex> {
    vec![
        TrackedIndex::new("Dow Jones", "^DJI"),
        TrackedIndex::new("S&P 500", "^GSPC"),
        TrackedIndex::new("NASDAQ", "^IXIC"),
        TrackedIndex::new("NIFTY 50", "^NSEI"),
        TrackedIndex::new("SENSEX", "^BSESN"),
        TrackedIndex::new("BANK NIFTY", "^NSEBANK"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            refresh: RefreshSettings::default(),
            source: SourceConfig::default(),
            telemetry: TelemetryConfig::default(),
            indices: default_indices(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_age_secs: default_max_age_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            stop_timeout_secs: default_stop_timeout_secs(),
            change_basis: ChangeBasis::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Yahoo,
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
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

impl RefreshSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    /// Refresher settings derived from this section
    pub fn to_refresh_config(&self) -> RefreshConfig {
        RefreshConfig::new(self.interval())
            .fetch_timeout(self.fetch_timeout())
            .max_backoff(Duration::from_secs(self.max_backoff_secs))
            .change_basis(self.change_basis)
    }
}

impl SourceConfig {
    /// Yahoo client settings derived from this section
    pub fn to_yahoo_config(&self) -> YahooConfig {
        YahooConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: self.user_agent.clone(),
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

    /// Apply a `PORT` value taken from the environment
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<(), ConfigError> {
        if let Some(raw) = port {
            self.server.port = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.to_string()))?;
        }
        Ok(())
    }

    /// Check the invariants the service relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indices.is_empty() {
            return Err(ConfigError::NoIndices);
        }

        let mut names = HashSet::new();
        let mut symbols = HashSet::new();
        for index in &self.indices {
            if !names.insert(index.name.as_str()) {
                return Err(ConfigError::DuplicateName(index.name.clone()));
            }
            if !symbols.insert(index.symbol.as_str()) {
                return Err(ConfigError::DuplicateSymbol(index.symbol.to_string()));
            }
        }

        if self.refresh.interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("interval_secs"));
        }
        if self.refresh.max_age_secs == 0 {
            return Err(ConfigError::ZeroDuration("max_age_secs"));
        }

        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
