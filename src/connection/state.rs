use serde::{Deserialize, Serialize};

/// Connection state as reported by a document-store driver's ready-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Connecting,
    Disconnecting,
    Unknown,
}

impl ConnectionState {
    /// Map a numeric ready-state (`0..=3`); anything else is `Unknown`
    pub fn from_ready_state(ready_state: u8) -> Self {
        match ready_state {
            0 => ConnectionState::Disconnected,
            1 => ConnectionState::Connected,
            2 => ConnectionState::Connecting,
            3 => ConnectionState::Disconnecting,
            _ => ConnectionState::Unknown,
        }
    }

    pub fn ready_state(&self) -> Option<u8> {
        match self {
            ConnectionState::Disconnected => Some(0),
            ConnectionState::Connected => Some(1),
            ConnectionState::Connecting => Some(2),
            ConnectionState::Disconnecting => Some(3),
            ConnectionState::Unknown => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Disconnecting => write!(f, "disconnecting"),
            ConnectionState::Unknown => write!(f, "unknown"),
        }
    }
}
