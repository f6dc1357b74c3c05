//! Connection abstraction consumed by the recovery monitor

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::broadcast;
use tracing::trace;

use super::state::ConnectionState;

/// Lifecycle event raised by a long-lived connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
    /// Driver-level error with its detail
    Error(String),
}

/// Errors reading a connection's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The driver could not report a ready-state
    Unavailable(String),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Unavailable(msg) => {
                write!(f, "connection state unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConnectionError {}

/// A long-lived connection whose lifecycle can be observed
///
/// Subscribing replaces the driver's `connected`/`disconnected`/`error`
/// callbacks with one event stream.
pub trait ConnectionSource: Send + Sync {
    /// Read the current ready-state
    fn current_state(&self) -> Result<ConnectionState, ConnectionError>;

    /// Subscribe to lifecycle events
    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent>;
}

/// In-process connection state that drivers update and monitors observe
#[derive(Debug, Clone)]
pub struct SharedConnection {
    ready_state: Arc<AtomicU8>,
    events: broadcast::Sender<ConnectionEvent>,
}

impl SharedConnection {
    pub fn new(initial: ConnectionState) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            ready_state: Arc::new(AtomicU8::new(encode(initial))),
            events,
        }
    }

    /// Update the ready-state and raise the matching event on a change
    ///
    /// Only transitions into `Connected` or `Disconnected` raise an event.
    pub fn set_state(&self, state: ConnectionState) {
        let previous = self.store_state(state);
        if previous == state {
            return;
        }

        match state {
            ConnectionState::Connected => self.emit(ConnectionEvent::Connected),
            ConnectionState::Disconnected => self.emit(ConnectionEvent::Disconnected),
            _ => {}
        }
    }

    /// Update the ready-state without raising an event, returning the previous state
    ///
    /// Mirrors drivers whose ready-state flips before their callbacks run.
    pub fn store_state(&self, state: ConnectionState) -> ConnectionState {
        let previous = self.ready_state.swap(encode(state), Ordering::SeqCst);
        ConnectionState::from_ready_state(previous)
    }

    pub fn report_error(&self, detail: impl Into<String>) {
        self.emit(ConnectionEvent::Error(detail.into()));
    }

    pub fn emit(&self, event: ConnectionEvent) {
        trace!("connection event: {event:?}");
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

impl ConnectionSource for SharedConnection {
    fn current_state(&self) -> Result<ConnectionState, ConnectionError> {
        Ok(ConnectionState::from_ready_state(
            self.ready_state.load(Ordering::SeqCst),
        ))
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }
}

fn encode(state: ConnectionState) -> u8 {
    state.ready_state().unwrap_or(u8::MAX)
}
