use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail, ensure};
use tracing::trace;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,

    pub cache: CacheConfig,

    pub document_store: DocumentStoreConfig,

    #[serde(default)]
    pub recovery: RecoveryConfig,

    /// Ceiling applied to every probe (optional - defaults to the clients' own)
    pub probe_timeout_ms: Option<u64>,

    /// Scheduled snapshots (optional - snapshots are then taken on request only)
    pub schedule: Option<ScheduleConfig>,

    /// Webhook for connection notifications (optional)
    pub notifications: Option<Webhook>,

    #[serde(default)]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_database_threshold")]
    pub degraded_threshold_ms: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CacheConfig {
    /// `host:port` of the cache
    pub address: String,
    #[serde(default = "default_cache_threshold")]
    pub degraded_threshold_ms: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct DocumentStoreConfig {
    /// Ping/health URL of the document store
    pub url: String,
    /// Regex the ping response body must match
    pub body_pattern: Option<String>,
    /// No threshold: the document store is classified healthy/down only
    pub degraded_threshold_ms: Option<u64>,
    /// How often the connection is pinged to keep its ready-state current
    #[serde(default = "default_liveness_interval")]
    pub liveness_interval_secs: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RecoveryConfig {
    #[serde(default = "default_recovery_poll")]
    pub poll_interval_ms: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_recovery_poll(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_schedule_interval")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Webhook {
    pub url: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    pub auth_token: Option<String>,
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth_token: None,
            enable_cors: default_enable_cors(),
        }
    }
}

fn default_database_threshold() -> u64 {
    1000
}

fn default_cache_threshold() -> u64 {
    500
}

fn default_liveness_interval() -> u64 {
    5
}

fn default_recovery_poll() -> u64 {
    5000
}

fn default_schedule_interval() -> u64 {
    60
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((crate::util::get_default_addr(), crate::util::get_default_port()))
}

fn default_enable_cors() -> bool {
    true
}

impl Config {
    pub fn database_threshold(&self) -> Duration {
        Duration::from_millis(self.database.degraded_threshold_ms)
    }

    pub fn cache_threshold(&self) -> Duration {
        Duration::from_millis(self.cache.degraded_threshold_ms)
    }

    pub fn document_store_threshold(&self) -> Option<Duration> {
        self.document_store
            .degraded_threshold_ms
            .map(Duration::from_millis)
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout_ms.map(Duration::from_millis)
    }

    pub fn recovery_poll_interval(&self) -> Duration {
        Duration::from_millis(self.recovery.poll_interval_ms)
    }

    /// Reject intervals and timeouts of zero
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.recovery.poll_interval_ms > 0,
            "recovery.poll_interval_ms must be greater than 0"
        );
        ensure!(
            self.document_store.liveness_interval_secs > 0,
            "document_store.liveness_interval_secs must be greater than 0"
        );
        if let Some(schedule) = &self.schedule {
            ensure!(
                schedule.interval_secs > 0,
                "schedule.interval_secs must be greater than 0"
            );
        }
        if self.probe_timeout_ms == Some(0) {
            bail!("probe_timeout_ms must be greater than 0 when set");
        }
        Ok(())
    }

    /// Apply `HEALTH_ADDR`, `HEALTH_PORT` and `HEALTH_SECRET` overrides
    pub fn apply_env(&mut self) {
        if let Some(addr) = crate::util::get_addr() {
            self.api.bind_addr.set_ip(addr.into());
        }
        if let Some(port) = crate::util::get_port() {
            self.api.bind_addr.set_port(port);
        }
        if let Some(secret) = crate::util::get_secret() {
            self.api.auth_token = Some(secret);
        }
    }
}

pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    let config: Config =
        serde_json::from_str(content).context("Invalid configuration file provided!")?;
    config.validate()?;

    trace!("loaded config: {config:?}");
    Ok(config)
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {path}"))?;
    parse_config(&file_content)
}
