//! Composite health snapshot
//!
//! The aggregator fans out every probe and the resource collector as
//! independent tasks and waits for all of them. Whatever happens to one task
//! (error, panic) only degrades its own entry; every key of the snapshot is
//! always populated.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, instrument, warn};

use super::metrics::ResourceCollector;
use super::probe::ServiceProbe;
use super::types::{ServiceHealth, SystemHealthSnapshot, SystemResourceSnapshot};

/// Runs all configured probes and the resource collector on demand
#[derive(Clone)]
pub struct HealthAggregator {
    database: ServiceProbe,
    redis: ServiceProbe,
    mongodb: ServiceProbe,
    system: Arc<dyn ResourceCollector>,
}

impl HealthAggregator {
    pub fn new(
        database: ServiceProbe,
        redis: ServiceProbe,
        mongodb: ServiceProbe,
        system: Arc<dyn ResourceCollector>,
    ) -> Self {
        Self {
            database,
            redis,
            mongodb,
            system,
        }
    }

    /// Probe everything live and assemble a snapshot
    ///
    /// Never fails. Nothing is cached between calls.
    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> SystemHealthSnapshot {
        let database = spawn_probe(&self.database);
        let redis = spawn_probe(&self.redis);
        let mongodb = spawn_probe(&self.mongodb);

        let collector = self.system.clone();
        let system = tokio::spawn(async move { collector.collect().await });

        let (database, redis, mongodb, system) = tokio::join!(database, redis, mongodb, system);

        let system = match system {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                warn!("resource collection failed, reporting zeros: {e:#}");
                SystemResourceSnapshot::unavailable()
            }
            Err(e) => {
                error!("resource collector task failed, reporting zeros: {e}");
                SystemResourceSnapshot::unavailable()
            }
        };

        let snapshot = SystemHealthSnapshot {
            database,
            redis,
            mongodb,
            system,
        };

        debug!(
            "health snapshot: database={}, redis={}, mongodb={}",
            snapshot.database.status, snapshot.redis.status, snapshot.mongodb.status
        );

        snapshot
    }
}

/// Run a probe on its own task so a panic stays contained to its entry
async fn spawn_probe(probe: &ServiceProbe) -> ServiceHealth {
    let start = Instant::now();
    let name = probe.name().to_string();
    let probe = probe.clone();

    let handle: JoinHandle<ServiceHealth> = tokio::spawn(async move { probe.check().await });

    match handle.await {
        Ok(health) => health,
        Err(e) => {
            error!("{name}: probe task failed: {e}");
            ServiceHealth::down(start.elapsed().as_millis() as u64)
        }
    }
}
