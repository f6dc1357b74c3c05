//! API shared state

use tokio::sync::broadcast;

use crate::actors::{connection_monitor::MonitorHandle, messages::SnapshotEvent};
use crate::health::HealthAggregator;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Aggregator invoked on every health request
    pub aggregator: HealthAggregator,

    /// Handle to the connection monitor for status and notifications
    pub monitor: MonitorHandle,

    /// Broadcast sender for scheduled snapshots (for WebSocket streaming)
    pub snapshot_tx: broadcast::Sender<SnapshotEvent>,
}

impl ApiState {
    pub fn new(
        aggregator: HealthAggregator,
        monitor: MonitorHandle,
        snapshot_tx: broadcast::Sender<SnapshotEvent>,
    ) -> Self {
        Self {
            aggregator,
            monitor,
            snapshot_tx,
        }
    }
}
