//! Timed single-attempt health probes
//!
//! A [`ServiceProbe`] wraps one lightweight operation a backing service exposes
//! (a trivial query, a `PING`, an admin ping) and turns a single invocation of
//! it into a [`ServiceHealth`]:
//!
//! ```text
//! operation fails                        → down      (responseTime = time until failure)
//! succeeds, elapsed >= degraded_after    → degraded
//! succeeds otherwise                     → healthy
//! ```
//!
//! There are no retries; retry cadence belongs to whoever schedules the probe.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{instrument, trace, warn};

use super::types::{ServiceHealth, ServiceStatus};

/// A lightweight, idempotent call against a backing service
#[async_trait]
pub trait Probe: Send + Sync {
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
impl<F, Fut> Probe for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn ping(&self) -> Result<()> {
        (self)().await
    }
}

impl ServiceStatus {
    /// Classify a finished probe by outcome and elapsed time
    ///
    /// Failure always wins over latency. Without a threshold a successful probe
    /// is always healthy.
    pub fn classify(succeeded: bool, elapsed: Duration, degraded_after: Option<Duration>) -> Self {
        if !succeeded {
            return ServiceStatus::Down;
        }

        match degraded_after {
            Some(threshold) if elapsed >= threshold => ServiceStatus::Degraded,
            _ => ServiceStatus::Healthy,
        }
    }
}

/// Timed probe for one backing service
#[derive(Clone)]
pub struct ServiceProbe {
    name: String,
    degraded_after: Option<Duration>,
    timeout: Option<Duration>,
    probe: Arc<dyn Probe>,
}

impl std::fmt::Debug for ServiceProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProbe")
            .field("name", &self.name)
            .field("degraded_after", &self.degraded_after)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ServiceProbe {
    pub fn new(name: impl Into<String>, probe: impl Probe + 'static) -> Self {
        Self {
            name: name.into(),
            degraded_after: None,
            timeout: None,
            probe: Arc::new(probe),
        }
    }

    /// Latency at or above which a successful probe is reported as degraded
    pub fn degraded_after(mut self, threshold: Duration) -> Self {
        self.degraded_after = Some(threshold);
        self
    }

    /// Hard ceiling for the operation; an overrun is reported as down
    ///
    /// Off by default: the backing client is expected to enforce its own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the operation once and classify the outcome
    #[instrument(skip(self), fields(service = %self.name))]
    pub async fn check(&self) -> ServiceHealth {
        let start = Instant::now();

        let result = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, self.probe.ping()).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!("probe timed out after {timeout:?}")),
            },
            None => self.probe.ping().await,
        };

        let elapsed = start.elapsed();
        let status = ServiceStatus::classify(result.is_ok(), elapsed, self.degraded_after);

        if let Err(e) = &result {
            warn!("probe failed after {}ms: {e:#}", elapsed.as_millis());
        } else {
            trace!("probe finished in {}ms -> {status}", elapsed.as_millis());
        }

        ServiceHealth::new(status, elapsed.as_millis() as u64)
    }
}
