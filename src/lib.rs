//! Composite health monitoring and connection recovery
//!
//! - [`health`]: timed probes for the relational database, cache and document
//!   store plus host resource sampling, aggregated into one snapshot
//! - [`actors::connection_monitor`]: tracks a long-lived connection through
//!   disconnect/error/recovery and announces each transition once
//! - [`api`]: the HTTP surface dashboards read snapshots from

pub mod actors;
pub mod alerts;
pub mod config;
pub mod connection;
pub mod health;
pub mod util;

#[cfg(feature = "api")]
pub mod api;

pub use actors::connection_monitor::MonitorHandle;
pub use actors::messages::{ConnectionNotification, MonitorStatus, NotificationKind};
pub use health::{HealthAggregator, ServiceHealth, ServiceStatus, SystemHealthSnapshot};
