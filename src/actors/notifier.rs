//! NotifierActor - Forwards connection notifications to a webhook
//!
//! Delivery failures are logged and counted, never propagated.

use anyhow::Result;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, instrument, warn};

use crate::alerts::NotificationManager;

use super::messages::{ConnectionNotification, NotifierCommand, NotifierStats};

pub struct NotifierActor {
    manager: NotificationManager,

    /// Notification receiver (broadcast subscription)
    notification_rx: broadcast::Receiver<ConnectionNotification>,

    /// Command receiver
    command_rx: mpsc::Receiver<NotifierCommand>,

    stats: NotifierStats,
}

impl NotifierActor {
    pub fn new(
        manager: NotificationManager,
        notification_rx: broadcast::Receiver<ConnectionNotification>,
        command_rx: mpsc::Receiver<NotifierCommand>,
    ) -> Self {
        Self {
            manager,
            notification_rx,
            command_rx,
            stats: NotifierStats::default(),
        }
    }

    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting notifier actor");

        loop {
            tokio::select! {
                result = self.notification_rx.recv() => {
                    match result {
                        Ok(notification) => self.deliver(notification).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("notifier lagged, skipped {skipped} notifications");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!("notification channel closed, shutting down");
                            break;
                        }
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        NotifierCommand::GetStats { respond_to } => {
                            let _ = respond_to.send(self.stats);
                        }
                        NotifierCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }
            }
        }

        debug!("notifier actor stopped");
    }

    async fn deliver(&mut self, notification: ConnectionNotification) {
        match self.manager.send(&notification).await {
            Ok(()) => self.stats.delivered += 1,
            Err(e) => {
                self.stats.failed += 1;
                error!("failed to deliver {} notification: {e:#}", notification.event);
            }
        }
    }
}

/// Handle for controlling a NotifierActor
#[derive(Clone)]
pub struct NotifierHandle {
    sender: mpsc::Sender<NotifierCommand>,
}

impl NotifierHandle {
    pub fn spawn(
        manager: NotificationManager,
        notification_rx: broadcast::Receiver<ConnectionNotification>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = NotifierActor::new(manager, notification_rx, cmd_rx);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    pub async fn stats(&self) -> Result<NotifierStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(NotifierCommand::GetStats { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    pub async fn shutdown(self) -> Result<()> {
        self.sender.send(NotifierCommand::Shutdown).await?;
        Ok(())
    }
}
