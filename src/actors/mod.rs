//! Actor-based monitoring system
//!
//! Each actor runs as an independent async task communicating via Tokio channels.
//!
//! ## Architecture Overview
//!
//! ```text
//!   ConnectionSource ──events──► ConnectionMonitorActor ──► Broadcast (notifications)
//!                                        ▲                        │
//!                                        │ recovery poll          ├──► NotifierActor ──► webhook
//!                                                                 └──► WebSocket clients
//!
//!   HealthAggregator ◄── HealthPollerActor ──► Broadcast (snapshots) ──► WebSocket clients
//! ```
//!
//! ## Actor Types
//!
//! - **ConnectionMonitorActor**: Tracks a long-lived connection and drives recovery checks
//! - **HealthPollerActor**: Takes composite health snapshots on a schedule
//! - **NotifierActor**: Forwards connection notifications to a webhook
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: Each actor has an mpsc command channel for control messages
//! 2. **Events**: Actors publish events to broadcast channels for fan-out
//! 3. **Request/Response**: oneshot channels for synchronous queries

pub mod connection_monitor;
pub mod health_poller;
pub mod messages;
pub mod notifier;
