//! Long-lived connection tracking
//!
//! The recovery monitor itself lives in [`crate::actors::connection_monitor`];
//! this module holds what it observes.

pub mod driver;
pub mod source;
pub mod state;

pub use driver::{DriverHandle, PingDriver};
pub use source::{ConnectionError, ConnectionEvent, ConnectionSource, SharedConnection};
pub use state::ConnectionState;
