//! ConnectionMonitorActor - Tracks a long-lived connection and drives recovery
//!
//! The actor owns all connection bookkeeping, so every lifecycle event, poll
//! tick and command is handled one at a time on a single task.
//!
//! ## State Machine
//!
//! ```text
//!              Disconnected / Error(detail)
//!   connected ─────────────────────────────► disconnected
//!       ▲      emit connection.error (Error)   │  had_connection_issue = true
//!       │      then connection.lost            │  start recovery timer
//!       │                                      │
//!       │  poll tick reads ready-state == 1    │
//!       └──────────────────────────────────────┘
//!          or Connected event:
//!          stop timer, emit connection.restored once,
//!          had_connection_issue = false
//! ```
//!
//! Events arriving while already disconnected only keep the timer running.
//! Starting a running timer and stopping a stopped one are no-ops.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, info, instrument, trace, warn};

use crate::connection::{ConnectionEvent, ConnectionSource, ConnectionState};
use crate::util::timer_period;

use super::messages::{ConnectionNotification, MonitorCommand, MonitorStatus, NotificationKind};

/// Actor that watches one connection and announces loss and recovery
pub struct ConnectionMonitorActor {
    /// Connection being watched
    connection: Arc<dyn ConnectionSource>,

    /// Lifecycle events of the connection
    event_rx: broadcast::Receiver<ConnectionEvent>,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<MonitorCommand>,

    /// Broadcast sender for connection notifications
    notification_tx: broadcast::Sender<ConnectionNotification>,

    /// Recovery poll cadence
    poll_interval: Duration,

    is_connected: bool,

    had_connection_issue: bool,

    /// Ready-state as last observed
    last_state: ConnectionState,

    /// Active recovery poll timer, `Some` only while waiting for recovery
    recovery: Option<Interval>,
}

impl ConnectionMonitorActor {
    /// Create a new monitor, reading the connection's ready-state once
    pub fn new(
        connection: Arc<dyn ConnectionSource>,
        poll_interval: Duration,
        command_rx: mpsc::Receiver<MonitorCommand>,
        notification_tx: broadcast::Sender<ConnectionNotification>,
    ) -> Self {
        // subscribe before reading so no transition slips in between
        let event_rx = connection.subscribe();

        let last_state = connection.current_state().unwrap_or_else(|e| {
            warn!("could not read initial connection state: {e}");
            ConnectionState::Unknown
        });

        debug!("initial connection state: {last_state}");

        Self {
            connection,
            event_rx,
            command_rx,
            notification_tx,
            poll_interval: timer_period(poll_interval, "recovery poll"),
            is_connected: last_state.is_connected(),
            had_connection_issue: false,
            last_state,
            recovery: None,
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command arrives, every handle is dropped or the
    /// connection's event stream closes. The recovery timer is always stopped
    /// on the way out.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting connection monitor actor");

        loop {
            tokio::select! {
                biased;

                result = self.event_rx.recv() => {
                    match result {
                        Ok(event) => self.handle_event(event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("connection monitor lagged, skipped {skipped} events");
                            self.reconcile();
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!("connection event stream closed, shutting down");
                            break;
                        }
                    }
                }

                _ = next_tick(&mut self.recovery) => {
                    self.poll_recovery();
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(MonitorCommand::GetStatus { respond_to }) => {
                            let _ = respond_to.send(self.status());
                        }
                        Some(MonitorCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }
                        None => {
                            debug!("all monitor handles dropped, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        self.stop_recovery_timer();
        debug!("connection monitor actor stopped");
    }

    fn handle_event(&mut self, event: ConnectionEvent) {
        trace!("handling connection event {event:?}");

        match event {
            ConnectionEvent::Connected => self.on_connected(),
            ConnectionEvent::Disconnected => {
                self.last_state = ConnectionState::Disconnected;
                self.on_connection_lost(None);
            }
            ConnectionEvent::Error(detail) => self.on_connection_lost(Some(detail)),
        }
    }

    /// Disconnect or error: announce once per transition, keep recovering
    fn on_connection_lost(&mut self, error: Option<String>) {
        self.had_connection_issue = true;

        if self.is_connected {
            self.is_connected = false;

            if let Some(detail) = error {
                warn!("connection error: {detail}");
                self.publish(NotificationKind::Error, Some(detail));
            }

            warn!("connection lost");
            self.publish(NotificationKind::Lost, None);
        } else if let Some(detail) = error {
            debug!("connection error while already disconnected: {detail}");
        } else {
            trace!("already disconnected");
        }

        self.start_recovery_timer();
    }

    /// Driver reports the connection is up again
    fn on_connected(&mut self) {
        self.last_state = ConnectionState::Connected;
        self.stop_recovery_timer();

        if self.is_connected {
            trace!("already connected");
            return;
        }

        self.is_connected = true;

        if self.had_connection_issue {
            self.announce_restored();
        } else {
            info!("connection established");
        }
    }

    /// One recovery poll: a failed read is inconclusive and keeps the timer
    fn poll_recovery(&mut self) {
        let state = match self.connection.current_state() {
            Ok(state) => state,
            Err(e) => {
                debug!("recovery check inconclusive: {e}");
                return;
            }
        };

        self.last_state = state;

        if state.is_connected() && !self.is_connected {
            self.is_connected = true;
            self.stop_recovery_timer();
            self.announce_restored();
        } else {
            trace!("recovery check: connection is {state}");
        }
    }

    /// Re-read the ready-state after missed events
    fn reconcile(&mut self) {
        match self.connection.current_state() {
            Ok(ConnectionState::Connected) => self.on_connected(),
            Ok(ConnectionState::Disconnected) => {
                self.last_state = ConnectionState::Disconnected;
                self.on_connection_lost(None);
            }
            Ok(state) => {
                self.last_state = state;
                debug!("reconciled connection state: {state}");
            }
            Err(e) => debug!("could not reconcile connection state: {e}"),
        }
    }

    fn announce_restored(&mut self) {
        info!("connection restored");
        self.publish(NotificationKind::Restored, None);
        self.had_connection_issue = false;
    }

    fn publish(&self, kind: NotificationKind, detail: Option<String>) {
        let notification = ConnectionNotification::new(kind, detail);
        if self.notification_tx.send(notification).is_err() {
            trace!("no subscribers for {kind}");
        }
    }

    fn start_recovery_timer(&mut self) {
        if self.recovery.is_some() {
            return;
        }

        let mut timer = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.recovery = Some(timer);

        debug!("started recovery checks every {:?}", self.poll_interval);
    }

    fn stop_recovery_timer(&mut self) {
        if self.recovery.take().is_some() {
            debug!("stopped recovery checks");
        }
    }

    fn status(&self) -> MonitorStatus {
        MonitorStatus {
            is_connected: self.is_connected,
            had_connection_issue: self.had_connection_issue,
            recovery_active: self.recovery.is_some(),
            state: self.last_state,
        }
    }
}

/// Resolve on the next recovery tick, or never if no timer is running
async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Handle for controlling a ConnectionMonitorActor
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,
    notification_tx: broadcast::Sender<ConnectionNotification>,
}

impl MonitorHandle {
    /// Spawn a monitor with its own notification channel
    pub fn spawn(connection: Arc<dyn ConnectionSource>, poll_interval: Duration) -> Self {
        let (notification_tx, _) = broadcast::channel(64);
        Self::spawn_with_sender(connection, poll_interval, notification_tx)
    }

    /// Spawn a monitor publishing to an existing notification channel
    pub fn spawn_with_sender(
        connection: Arc<dyn ConnectionSource>,
        poll_interval: Duration,
        notification_tx: broadcast::Sender<ConnectionNotification>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor =
            ConnectionMonitorActor::new(connection, poll_interval, cmd_rx, notification_tx.clone());

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            notification_tx,
        }
    }

    /// Subscribe to connection notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionNotification> {
        self.notification_tx.subscribe()
    }

    /// Query the monitor's current view of the connection
    pub async fn status(&self) -> Result<MonitorStatus> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::GetStatus { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    /// Shut down the monitor, cancelling any active recovery timer
    pub async fn shutdown(self) -> Result<()> {
        self.sender.send(MonitorCommand::Shutdown).await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
