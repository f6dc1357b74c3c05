//! Host resource sampling
//!
//! [`SystemMetricsCollector`] turns a [`MetricsSource`] into a
//! [`SystemResourceSnapshot`]. A metric that cannot be read is reported as `0`
//! and counted, so operators can tell "0% used" from "measurement failed" by
//! the warning log and [`SystemMetricsCollector::failure_count`].

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use sysinfo::{Disks, MINIMUM_CPU_UPDATE_INTERVAL, System};
use tracing::{instrument, trace, warn};

use super::types::SystemResourceSnapshot;

/// Source of host usage percentages
pub trait MetricsSource: Send + Sync {
    fn cpu_usage(&self) -> Result<f32>;
    fn memory_usage(&self) -> Result<f32>;
    fn disk_usage(&self) -> Result<f32>;
}

/// Anything that can produce a resource snapshot for the aggregator
#[async_trait]
pub trait ResourceCollector: Send + Sync {
    async fn collect(&self) -> Result<SystemResourceSnapshot>;
}

/// [`MetricsSource`] backed by `sysinfo`
pub struct SysinfoSource {
    host: Mutex<HostState>,
}

struct HostState {
    system: System,
    cpu_refreshed_at: Instant,
    /// Usage from the last refresh that came a full update interval after the one before
    cpu_usage: Option<f32>,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSource {
    pub fn new() -> Self {
        let mut system = System::new();
        // CPU usage is a delta between refreshes, so take the baseline now
        system.refresh_cpu_usage();
        system.refresh_memory();

        Self {
            host: Mutex::new(HostState {
                system,
                cpu_refreshed_at: Instant::now(),
                cpu_usage: None,
            }),
        }
    }

    fn with_host<T>(&self, f: impl FnOnce(&mut HostState) -> T) -> Result<T> {
        let mut host = self
            .host
            .lock()
            .map_err(|_| anyhow!("system handle poisoned"))?;
        Ok(f(&mut host))
    }
}

impl MetricsSource for SysinfoSource {
    /// Refreshes at most once per `MINIMUM_CPU_UPDATE_INTERVAL`; closer samples
    /// reuse the previous reading, and there is none until the first interval
    /// after the baseline has passed.
    fn cpu_usage(&self) -> Result<f32> {
        self.with_host(|host| {
            if host.cpu_refreshed_at.elapsed() >= MINIMUM_CPU_UPDATE_INTERVAL {
                host.system.refresh_cpu_usage();
                host.cpu_refreshed_at = Instant::now();
                host.cpu_usage = Some(host.system.global_cpu_usage());
            }
            host.cpu_usage
        })?
        .ok_or_else(|| anyhow!("cpu usage needs {MINIMUM_CPU_UPDATE_INTERVAL:?} after the baseline"))
    }

    fn memory_usage(&self) -> Result<f32> {
        let (used, total) = self.with_host(|host| {
            host.system.refresh_memory();
            (host.system.used_memory(), host.system.total_memory())
        })?;

        percentage(used, total).ok_or_else(|| anyhow!("total memory reported as 0"))
    }

    fn disk_usage(&self) -> Result<f32> {
        let disks = Disks::new_with_refreshed_list();

        let (total, available) = disks.list().iter().fold((0u64, 0u64), |(t, a), disk| {
            (t + disk.total_space(), a + disk.available_space())
        });

        percentage(total.saturating_sub(available), total)
            .ok_or_else(|| anyhow!("no disks with capacity found"))
    }
}

fn percentage(used: u64, total: u64) -> Option<f32> {
    if total == 0 {
        return None;
    }
    Some(((used as f64 / total as f64) * 100.0) as f32)
}

/// Samples a [`MetricsSource`] with per-metric zero fallback
pub struct SystemMetricsCollector<S> {
    source: Arc<S>,
    failures: Arc<AtomicU64>,
}

impl<S> Clone for SystemMetricsCollector<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            failures: self.failures.clone(),
        }
    }
}

impl SystemMetricsCollector<SysinfoSource> {
    /// Collector for the current host
    pub fn host() -> Self {
        Self::new(SysinfoSource::new())
    }
}

impl<S: MetricsSource> SystemMetricsCollector<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of individual metric reads that failed so far
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Read every metric once; never fails
    #[instrument(skip_all)]
    pub fn sample(&self) -> SystemResourceSnapshot {
        let cpu_usage = self.read("cpu", || self.source.cpu_usage());
        let memory_usage = self.read("memory", || self.source.memory_usage());
        let disk_usage = self.read("disk", || self.source.disk_usage());

        trace!("sampled cpu {cpu_usage:.1}%, memory {memory_usage:.1}%, disk {disk_usage:.1}%");

        SystemResourceSnapshot {
            cpu_usage,
            memory_usage,
            disk_usage,
            last_checked: Utc::now(),
        }
    }

    fn read(&self, metric: &str, f: impl FnOnce() -> Result<f32>) -> f32 {
        let reading = f().and_then(|value| {
            if value.is_finite() {
                Ok(value)
            } else {
                Err(anyhow!("non-finite reading {value}"))
            }
        });

        match reading {
            Ok(value) => value.clamp(0.0, 100.0),
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(metric, "failed to read {metric} usage, reporting 0: {e:#}");
                0.0
            }
        }
    }
}

#[async_trait]
impl<S: MetricsSource + 'static> ResourceCollector for SystemMetricsCollector<S> {
    async fn collect(&self) -> Result<SystemResourceSnapshot> {
        let collector = self.clone();
        let snapshot = tokio::task::spawn_blocking(move || collector.sample()).await?;
        Ok(snapshot)
    }
}
