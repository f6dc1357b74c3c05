//! Message types for actor communication
//!
//! ## Design Principles
//!
//! 1. **Commands**: Request/response messages sent to specific actors via mpsc
//! 2. **Events**: Broadcast notifications published to multiple subscribers
//! 3. **Immutability**: All events are cloneable for multi-subscriber patterns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::connection::ConnectionState;
use crate::health::SystemHealthSnapshot;

/// Kind of connection lifecycle notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "connection.error")]
    Error,
    #[serde(rename = "connection.lost")]
    Lost,
    #[serde(rename = "connection.restored")]
    Restored,
}

impl NotificationKind {
    /// Event name as published on the event bus
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Error => "connection.error",
            NotificationKind::Lost => "connection.lost",
            NotificationKind::Restored => "connection.restored",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event published by the connection monitor for alerting consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionNotification {
    pub event: NotificationKind,

    pub timestamp: DateTime<Utc>,

    /// Error detail for `connection.error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ConnectionNotification {
    pub fn new(event: NotificationKind, detail: Option<String>) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
            detail,
        }
    }
}

/// Commands that can be sent to the ConnectionMonitorActor
#[derive(Debug)]
pub enum MonitorCommand {
    /// Report the monitor's current view of the connection
    GetStatus {
        respond_to: oneshot::Sender<MonitorStatus>,
    },

    /// Stop the recovery timer and exit
    Shutdown,
}

/// Snapshot of the connection monitor's state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    /// Last known settled state
    pub is_connected: bool,

    /// Set from the first disconnect/error until recovery is announced
    pub had_connection_issue: bool,

    /// Whether the recovery poll timer is running
    pub recovery_active: bool,

    /// Ready-state as last read from the connection
    pub state: ConnectionState,
}

/// Event published when a scheduled health snapshot was taken
#[derive(Debug, Clone)]
pub struct SnapshotEvent {
    pub snapshot: SystemHealthSnapshot,

    pub timestamp: DateTime<Utc>,
}

/// Commands that can be sent to the HealthPollerActor
#[derive(Debug)]
pub enum PollerCommand {
    /// Take a snapshot immediately (bypassing the interval timer)
    PollNow {
        respond_to: oneshot::Sender<SystemHealthSnapshot>,
    },

    /// Gracefully shut down the poller
    Shutdown,
}

/// Commands that can be sent to the NotifierActor
#[derive(Debug)]
pub enum NotifierCommand {
    /// Report how many notifications were delivered and failed
    GetStats {
        respond_to: oneshot::Sender<NotifierStats>,
    },

    /// Gracefully shut down the notifier
    Shutdown,
}

/// Delivery counters of the notifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifierStats {
    pub delivered: u64,
    pub failed: u64,
}
