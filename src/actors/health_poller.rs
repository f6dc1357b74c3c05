//! HealthPollerActor - Takes health snapshots on a schedule
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → HealthAggregator::snapshot → Publish SnapshotEvent → [WebSocket clients, ...]
//!     ↑
//!     └─── Commands (PollNow, Shutdown)
//! ```

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument, trace, warn};

use crate::health::{HealthAggregator, ServiceStatus, SystemHealthSnapshot};
use crate::util::timer_period;

use super::messages::{PollerCommand, SnapshotEvent};

/// Actor that runs the aggregator at a fixed interval
pub struct HealthPollerActor {
    aggregator: HealthAggregator,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<PollerCommand>,

    /// Broadcast sender for publishing snapshots
    snapshot_tx: broadcast::Sender<SnapshotEvent>,

    /// Current polling interval
    interval_duration: Duration,
}

impl HealthPollerActor {
    pub fn new(
        aggregator: HealthAggregator,
        interval_duration: Duration,
        command_rx: mpsc::Receiver<PollerCommand>,
        snapshot_tx: broadcast::Sender<SnapshotEvent>,
    ) -> Self {
        Self {
            aggregator,
            command_rx,
            snapshot_tx,
            interval_duration: timer_period(interval_duration, "health poll"),
        }
    }

    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!(
            "starting health poller actor with interval {:?}",
            self.interval_duration
        );

        let mut ticker = interval(self.interval_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll().await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        PollerCommand::PollNow { respond_to } => {
                            debug!("received PollNow command");
                            let snapshot = self.poll().await;
                            let _ = respond_to.send(snapshot);
                        }

                        PollerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("health poller actor stopped");
    }

    async fn poll(&self) -> SystemHealthSnapshot {
        let snapshot = self.aggregator.snapshot().await;

        for (service, status) in snapshot.unhealthy_services() {
            match status {
                ServiceStatus::Down => warn!("{service} is down"),
                _ => info!("{service} is {status}"),
            }
        }

        let event = SnapshotEvent {
            snapshot: snapshot.clone(),
            timestamp: Utc::now(),
        };

        if self.snapshot_tx.send(event).is_err() {
            trace!("no snapshot subscribers");
        }

        snapshot
    }
}

/// Handle for controlling a HealthPollerActor
#[derive(Clone)]
pub struct PollerHandle {
    sender: mpsc::Sender<PollerCommand>,
}

impl PollerHandle {
    pub fn spawn(
        aggregator: HealthAggregator,
        interval: Duration,
        snapshot_tx: broadcast::Sender<SnapshotEvent>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = HealthPollerActor::new(aggregator, interval, cmd_rx, snapshot_tx);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Take a snapshot immediately
    pub async fn poll_now(&self) -> Result<SystemHealthSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::PollNow { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    pub async fn shutdown(self) -> Result<()> {
        self.sender.send(PollerCommand::Shutdown).await?;
        Ok(())
    }
}
