//! Integration tests for connection loss and recovery
//!
//! These tests verify that:
//! - A recovery poll that sees the connection first announces it exactly once
//! - Errors while already disconnected never repeat the loss notification
//! - A failing ping announces the error and exactly one loss
//! - A ping driver feeding the monitor ends up at the webhook

use std::sync::Arc;
use std::time::Duration;

use health_monitoring::{
    MonitorHandle, NotificationKind,
    actors::notifier::NotifierHandle,
    alerts::NotificationManager,
    config::Webhook,
    connection::{ConnectionEvent, ConnectionState, PingDriver, SharedConnection},
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

const POLL: Duration = Duration::from_millis(20);

#[tokio::test]
async fn test_poll_detects_reconnect_before_driver_event() {
    let connection = SharedConnection::new(ConnectionState::Connected);
    let monitor = MonitorHandle::spawn(Arc::new(connection.clone()), POLL);
    let mut rx = monitor.subscribe();

    connection.set_state(ConnectionState::Disconnected);
    assert_eq!(next_notification(&mut rx).await.event, NotificationKind::Lost);

    let status = monitor.status().await.unwrap();
    assert!(!status.is_connected);
    assert!(status.had_connection_issue);
    assert!(status.recovery_active);

    // driver reconnects but its event is late
    connection.store_state(ConnectionState::Connected);
    assert_eq!(
        next_notification(&mut rx).await.event,
        NotificationKind::Restored
    );

    connection.emit(ConnectionEvent::Connected);
    assert_quiet(&mut rx).await;

    let status = monitor.status().await.unwrap();
    assert!(status.is_connected);
    assert!(!status.had_connection_issue);
    assert!(!status.recovery_active);

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_errors_while_disconnected_announce_loss_once() {
    let connection = SharedConnection::new(ConnectionState::Connected);
    let monitor = MonitorHandle::spawn(Arc::new(connection.clone()), POLL);
    let mut rx = monitor.subscribe();

    connection.set_state(ConnectionState::Disconnected);
    for attempt in 0..3 {
        connection.report_error(format!("reconnect attempt {attempt} failed"));
    }

    assert_eq!(next_notification(&mut rx).await.event, NotificationKind::Lost);
    assert_quiet(&mut rx).await;

    let status = monitor.status().await.unwrap();
    assert!(status.recovery_active);
    assert!(status.had_connection_issue);

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_repeated_outages_pair_up() {
    let connection = SharedConnection::new(ConnectionState::Connected);
    let monitor = MonitorHandle::spawn(Arc::new(connection.clone()), POLL);
    let mut rx = monitor.subscribe();

    for _ in 0..3 {
        connection.set_state(ConnectionState::Disconnected);
        assert_eq!(next_notification(&mut rx).await.event, NotificationKind::Lost);

        connection.set_state(ConnectionState::Connected);
        assert_eq!(
            next_notification(&mut rx).await.event,
            NotificationKind::Restored
        );
    }

    assert_quiet(&mut rx).await;
    assert!(!monitor.status().await.unwrap().recovery_active);

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_first_connect_is_silent() {
    let connection = SharedConnection::new(ConnectionState::Connecting);
    let monitor = MonitorHandle::spawn(Arc::new(connection.clone()), POLL);
    let mut rx = monitor.subscribe();

    connection.set_state(ConnectionState::Connected);
    assert_quiet(&mut rx).await;

    let status = monitor.status().await.unwrap();
    assert!(status.is_connected);
    assert!(!status.had_connection_issue);
    assert!(!status.recovery_active);

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_driver_outage_announces_error_and_loss_at_webhook() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(serde_json::json!({
            "event": "connection.error",
            "connection": "mongodb",
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(serde_json::json!({
            "event": "connection.lost",
            "connection": "mongodb",
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(serde_json::json!({
            "event": "connection.restored",
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connection = SharedConnection::new(ConnectionState::Connected);
    let ping = SwitchableProbe::default();
    let driver = PingDriver::new(Arc::new(ping.clone()), connection.clone(), POLL).spawn();

    let monitor = MonitorHandle::spawn(Arc::new(connection), Duration::from_millis(50));
    let notifier = NotifierHandle::spawn(
        NotificationManager::new(
            Webhook {
                url: format!("{}/hook", mock_server.uri()),
            },
            "mongodb",
        ),
        monitor.subscribe(),
    );
    let mut rx = monitor.subscribe();

    ping.set_failing(true);
    let error = next_notification(&mut rx).await;
    assert_eq!(error.event, NotificationKind::Error);
    assert!(
        error
            .detail
            .as_deref()
            .is_some_and(|detail| detail.contains("server selection timed out"))
    );
    assert_eq!(next_notification(&mut rx).await.event, NotificationKind::Lost);

    ping.set_failing(false);
    assert_eq!(
        next_notification(&mut rx).await.event,
        NotificationKind::Restored
    );

    let mut stats = notifier.stats().await.unwrap();
    for _ in 0..50 {
        if stats.delivered == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        stats = notifier.stats().await.unwrap();
    }
    assert_eq!(stats.delivered, 3);
    assert_eq!(stats.failed, 0);

    driver.shutdown();
    notifier.shutdown().await.unwrap();
    monitor.shutdown().await.unwrap();
    mock_server.verify().await;
}

#[tokio::test]
async fn test_sustained_ping_failures_announce_loss_once() {
    let connection = SharedConnection::new(ConnectionState::Connected);
    let ping = SwitchableProbe::default();
    let monitor = MonitorHandle::spawn(Arc::new(connection.clone()), POLL);
    let mut rx = monitor.subscribe();
    let driver = PingDriver::new(Arc::new(ping.clone()), connection, POLL).spawn();

    ping.set_failing(true);

    assert_eq!(next_notification(&mut rx).await.event, NotificationKind::Error);
    assert_eq!(next_notification(&mut rx).await.event, NotificationKind::Lost);

    // several more failing pings and recovery checks go by
    assert_quiet(&mut rx).await;

    let status = monitor.status().await.unwrap();
    assert!(!status.is_connected);
    assert!(status.recovery_active);

    driver.shutdown();
    monitor.shutdown().await.unwrap();
}
