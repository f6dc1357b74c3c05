//! Composite health checks for the backing services
//!
//! ```text
//!   ServiceProbe (database) ─┐
//!   ServiceProbe (redis)    ─┤
//!   ServiceProbe (mongodb)  ─┼──► HealthAggregator ──► SystemHealthSnapshot
//!   SystemMetricsCollector  ─┘
//! ```

pub mod aggregator;
pub mod metrics;
pub mod probe;
pub mod probes;
pub mod types;

pub use aggregator::HealthAggregator;
pub use metrics::{MetricsSource, ResourceCollector, SysinfoSource, SystemMetricsCollector};
pub use probe::{Probe, ServiceProbe};
pub use types::{ServiceHealth, ServiceStatus, SystemHealthSnapshot, SystemResourceSnapshot};
