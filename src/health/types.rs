//! Health snapshot types
//!
//! These types are what the health endpoint serializes. Field names follow the
//! dashboard's JSON shape (`responseTime`, `lastChecked`, `cpuUsage`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a single backing service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Probe succeeded within its latency threshold
    Healthy,
    /// Probe succeeded but exceeded its latency threshold
    Degraded,
    /// Probe failed
    Down,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ServiceStatus {
    /// Get the string representation (lowercase)
    ///
    /// This matches the serde serialization format.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Degraded => "degraded",
            ServiceStatus::Down => "down",
        }
    }
}

/// Result of one probe invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub status: ServiceStatus,

    /// Elapsed wall-clock time of the probe in milliseconds
    #[serde(rename = "responseTime")]
    pub response_time_ms: u64,

    #[serde(rename = "lastChecked")]
    pub last_checked: DateTime<Utc>,
}

impl ServiceHealth {
    pub fn new(status: ServiceStatus, response_time_ms: u64) -> Self {
        Self {
            status,
            response_time_ms,
            last_checked: Utc::now(),
        }
    }

    pub fn down(response_time_ms: u64) -> Self {
        Self::new(ServiceStatus::Down, response_time_ms)
    }
}

/// Host resource usage in percent
///
/// A value of `0` may mean "measurement unavailable"; see
/// [`SystemResourceSnapshot::unavailable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemResourceSnapshot {
    pub cpu_usage: f32,
    pub memory_usage: f32,
    pub disk_usage: f32,
    pub last_checked: DateTime<Utc>,
}

impl SystemResourceSnapshot {
    /// All-zero sentinel with a fresh timestamp, used when sampling failed entirely
    pub fn unavailable() -> Self {
        Self {
            cpu_usage: 0.0,
            memory_usage: 0.0,
            disk_usage: 0.0,
            last_checked: Utc::now(),
        }
    }
}

/// Composite health snapshot served by the health endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealthSnapshot {
    pub database: ServiceHealth,
    pub redis: ServiceHealth,
    pub mongodb: ServiceHealth,
    pub system: SystemResourceSnapshot,
}

impl SystemHealthSnapshot {
    /// Services that are not healthy, by name
    pub fn unhealthy_services(&self) -> Vec<(&'static str, ServiceStatus)> {
        [
            ("database", self.database.status),
            ("redis", self.redis.status),
            ("mongodb", self.mongodb.status),
        ]
        .into_iter()
        .filter(|(_, status)| *status != ServiceStatus::Healthy)
        .collect()
    }
}
