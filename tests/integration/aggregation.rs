//! Integration tests for composite health snapshots
//!
//! These tests verify that:
//! - Latency thresholds classify each service independently
//! - One failing service never affects the others
//! - Resource collection failures degrade to zeros
//! - The snapshot shape is the same whatever fails
//! - A service that accepts connections but never answers still yields a snapshot

use std::sync::Arc;
use std::time::Duration;

use health_monitoring::{
    HealthAggregator, ServiceStatus,
    health::{ServiceProbe, probes::RespPingProbe},
};
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_reference_snapshot() {
    let aggregator = HealthAggregator::new(
        slow_probe(
            "database",
            Duration::from_millis(1200),
            Duration::from_millis(1000),
        ),
        slow_probe("redis", Duration::from_millis(600), Duration::from_millis(500)),
        instant_probe("mongodb"),
        fixed_collector(45.2, 68.1, 23.7),
    );

    let snapshot = aggregator.snapshot().await;

    assert_eq!(snapshot.database.status, ServiceStatus::Degraded);
    assert_eq!(snapshot.redis.status, ServiceStatus::Degraded);
    assert_eq!(snapshot.mongodb.status, ServiceStatus::Healthy);
    assert!(snapshot.database.response_time_ms >= 1200);
    assert!(snapshot.redis.response_time_ms >= 600);

    assert_eq!(snapshot.system.cpu_usage, 45.2);
    assert_eq!(snapshot.system.memory_usage, 68.1);
    assert_eq!(snapshot.system.disk_usage, 23.7);
}

#[tokio::test(start_paused = true)]
async fn test_fast_probes_are_healthy() {
    let aggregator = HealthAggregator::new(
        slow_probe("database", Duration::from_millis(15), Duration::from_millis(1000)),
        slow_probe("redis", Duration::from_millis(2), Duration::from_millis(500)),
        instant_probe("mongodb"),
        fixed_collector(1.0, 2.0, 3.0),
    );

    let snapshot = aggregator.snapshot().await;

    assert!(snapshot.unhealthy_services().is_empty());
}

#[tokio::test]
async fn test_failing_database_leaves_others_untouched() {
    let aggregator = HealthAggregator::new(
        failing_probe("database"),
        instant_probe("redis"),
        instant_probe("mongodb"),
        fixed_collector(5.0, 6.0, 7.0),
    );

    let snapshot = aggregator.snapshot().await;

    assert_eq!(snapshot.database.status, ServiceStatus::Down);
    assert_eq!(snapshot.redis.status, ServiceStatus::Healthy);
    assert_eq!(snapshot.mongodb.status, ServiceStatus::Healthy);
    assert_eq!(
        snapshot.unhealthy_services(),
        vec![("database", ServiceStatus::Down)]
    );
}

#[tokio::test]
async fn test_broken_collector_reports_zeros() {
    let aggregator = HealthAggregator::new(
        instant_probe("database"),
        instant_probe("redis"),
        instant_probe("mongodb"),
        Arc::new(BrokenCollector),
    );

    let snapshot = aggregator.snapshot().await;

    assert_eq!(snapshot.system.cpu_usage, 0.0);
    assert_eq!(snapshot.system.memory_usage, 0.0);
    assert_eq!(snapshot.system.disk_usage, 0.0);
    assert_eq!(snapshot.database.status, ServiceStatus::Healthy);
}

#[tokio::test]
async fn test_shape_is_stable_when_everything_fails() {
    let aggregator = HealthAggregator::new(
        failing_probe("database"),
        failing_probe("redis"),
        failing_probe("mongodb"),
        Arc::new(BrokenCollector),
    );

    let json = serde_json::to_value(aggregator.snapshot().await).unwrap();
    let object = json.as_object().unwrap();

    let mut keys: Vec<_> = object.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["database", "mongodb", "redis", "system"]);

    for service in ["database", "redis", "mongodb"] {
        assert_eq!(json[service]["status"], "down");
        assert!(json[service]["responseTime"].is_u64());
        assert!(json[service]["lastChecked"].is_string());
    }
    assert_eq!(json["system"]["cpuUsage"], 0.0);
    assert!(json["system"]["lastChecked"].is_string());
}

#[tokio::test(start_paused = true)]
async fn test_probes_run_concurrently() {
    let delay = Duration::from_millis(800);
    let threshold = Duration::from_secs(5);
    let aggregator = HealthAggregator::new(
        slow_probe("database", delay, threshold),
        slow_probe("redis", delay, threshold),
        slow_probe("mongodb", delay, threshold),
        fixed_collector(0.0, 0.0, 0.0),
    );

    let start = tokio::time::Instant::now();
    aggregator.snapshot().await;

    assert!(start.elapsed() < delay * 2);
}

#[tokio::test]
async fn test_silent_cache_does_not_stall_snapshot() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let mut held = vec![];
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let aggregator = HealthAggregator::new(
        instant_probe("database"),
        ServiceProbe::new(
            "redis",
            RespPingProbe::new(addr).with_timeout(Duration::from_millis(300)),
        ),
        instant_probe("mongodb"),
        fixed_collector(1.0, 2.0, 3.0),
    );

    let snapshot = tokio::time::timeout(Duration::from_secs(10), aggregator.snapshot())
        .await
        .expect("snapshot must finish while the cache stays silent");

    assert_eq!(snapshot.redis.status, ServiceStatus::Down);
    assert!(snapshot.redis.response_time_ms >= 300);
    assert_eq!(snapshot.database.status, ServiceStatus::Healthy);
    assert_eq!(snapshot.mongodb.status, ServiceStatus::Healthy);
}
