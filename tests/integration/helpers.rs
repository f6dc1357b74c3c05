//! Helper functions for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use health_monitoring::{
    ConnectionNotification, HealthAggregator,
    health::{
        MetricsSource, Probe, ResourceCollector, ServiceProbe, SystemMetricsCollector,
        SystemResourceSnapshot,
    },
};
use tokio::sync::broadcast;

/// Probe that succeeds after a fixed delay
pub fn slow_probe(name: &str, delay: Duration, degraded_after: Duration) -> ServiceProbe {
    ServiceProbe::new(name, move || async move {
        tokio::time::sleep(delay).await;
        Ok::<(), anyhow::Error>(())
    })
    .degraded_after(degraded_after)
}

pub fn instant_probe(name: &str) -> ServiceProbe {
    ServiceProbe::new(name, || async { Ok::<(), anyhow::Error>(()) })
}

pub fn failing_probe(name: &str) -> ServiceProbe {
    ServiceProbe::new(name, || async {
        Err::<(), _>(anyhow!("connection refused"))
    })
}

/// Host metrics with fixed readings
pub struct FixedSource {
    pub cpu: f32,
    pub memory: f32,
    pub disk: f32,
}

impl MetricsSource for FixedSource {
    fn cpu_usage(&self) -> Result<f32> {
        Ok(self.cpu)
    }

    fn memory_usage(&self) -> Result<f32> {
        Ok(self.memory)
    }

    fn disk_usage(&self) -> Result<f32> {
        Ok(self.disk)
    }
}

pub fn fixed_collector(cpu: f32, memory: f32, disk: f32) -> Arc<dyn ResourceCollector> {
    Arc::new(SystemMetricsCollector::new(FixedSource { cpu, memory, disk }))
}

/// Collector that fails as a whole
pub struct BrokenCollector;

#[async_trait]
impl ResourceCollector for BrokenCollector {
    async fn collect(&self) -> Result<SystemResourceSnapshot> {
        bail!("metrics backend unreachable")
    }
}

/// Aggregator where every service answers instantly
pub fn healthy_aggregator() -> HealthAggregator {
    HealthAggregator::new(
        instant_probe("database"),
        instant_probe("redis"),
        instant_probe("mongodb"),
        fixed_collector(10.0, 20.0, 30.0),
    )
}

/// Ping that can be switched between success and failure
#[derive(Clone, Default)]
pub struct SwitchableProbe {
    failing: Arc<AtomicBool>,
}

impl SwitchableProbe {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Probe for SwitchableProbe {
    async fn ping(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("server selection timed out");
        }
        Ok(())
    }
}

/// Wait for the next notification, failing the test after a second
pub async fn next_notification(
    rx: &mut broadcast::Receiver<ConnectionNotification>,
) -> ConnectionNotification {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for notification")
        .expect("notification channel closed")
}

/// Assert nothing else arrives within a short window
pub async fn assert_quiet(rx: &mut broadcast::Receiver<ConnectionNotification>) {
    let result = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(result.is_err(), "unexpected notification: {result:?}");
}
