//! Ping-based connection driver
//!
//! Keeps a [`SharedConnection`] in step with a backing service that has no
//! event-emitting client of its own, by pinging it on a fixed interval.
//!
//! ```text
//! ping ok    → ready-state connected     (raises `Connected` on change)
//! ping error → `Error(detail)` if it was connected, then ready-state disconnected
//!              (raises `Disconnected` on change)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, instrument, trace};

use crate::health::Probe;
use crate::util::timer_period;

use super::source::{ConnectionSource, SharedConnection};
use super::state::ConnectionState;

pub struct PingDriver {
    probe: Arc<dyn Probe>,
    connection: SharedConnection,
    interval: Duration,
}

impl PingDriver {
    pub fn new(probe: Arc<dyn Probe>, connection: SharedConnection, interval: Duration) -> Self {
        Self {
            probe,
            connection,
            interval: timer_period(interval, "ping"),
        }
    }

    /// Ping once and update the connection
    pub async fn drive_once(&self) {
        let was_connected = matches!(
            self.connection.current_state(),
            Ok(ConnectionState::Connected)
        );

        match self.probe.ping().await {
            Ok(()) => {
                trace!("ping succeeded");
                self.connection.set_state(ConnectionState::Connected);
            }
            Err(e) => {
                debug!("ping failed: {e:#}");
                if was_connected {
                    self.connection.report_error(format!("{e:#}"));
                }
                self.connection.set_state(ConnectionState::Disconnected);
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn run(self) {
        debug!("starting ping driver with interval {:?}", self.interval);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.drive_once().await;
        }
    }

    pub fn spawn(self) -> DriverHandle {
        DriverHandle {
            task: tokio::spawn(self.run()),
        }
    }
}

/// Handle for a running [`PingDriver`]
pub struct DriverHandle {
    task: JoinHandle<()>,
}

impl DriverHandle {
    pub fn shutdown(self) {
        self.task.abort();
    }
}
