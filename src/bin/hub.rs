use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use health_monitoring::{
    actors::{
        connection_monitor::MonitorHandle, health_poller::PollerHandle, notifier::NotifierHandle,
    },
    alerts::NotificationManager,
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, read_config_file},
    connection::{ConnectionState, PingDriver, SharedConnection},
    health::{
        HealthAggregator, Probe, ServiceProbe, SystemMetricsCollector,
        probes::{DEFAULT_TIMEOUT, HttpProbe, RespPingProbe, SqlProbe},
    },
};
use tokio::sync::broadcast;
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("health_monitoring", LevelFilter::DEBUG),
        ("health_hub", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

/// Apply the shared settings to one probe
fn probe(
    config: &Config,
    name: &str,
    probe: impl Probe + 'static,
    degraded_after: Option<Duration>,
) -> ServiceProbe {
    let mut service = ServiceProbe::new(name, probe);
    if let Some(threshold) = degraded_after {
        service = service.degraded_after(threshold);
    }
    if let Some(timeout) = config.probe_timeout() {
        service = service.with_timeout(timeout);
    }
    service
}

/// Client deadline: the configured probe timeout, or the clients' default
fn client_timeout(config: &Config) -> Duration {
    config.probe_timeout().unwrap_or(DEFAULT_TIMEOUT)
}

fn document_store_probe(config: &Config) -> anyhow::Result<HttpProbe> {
    let probe = HttpProbe::new(&config.document_store.url).with_timeout(client_timeout(config));
    match &config.document_store.body_pattern {
        Some(pattern) => probe.with_body_pattern(pattern),
        None => Ok(probe),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let mut config = read_config_file(&args.file)?;
    config.apply_env();

    let document_store = document_store_probe(&config)?;

    let aggregator = HealthAggregator::new(
        probe(
            &config,
            "database",
            SqlProbe::connect_lazy(&config.database.url)?,
            Some(config.database_threshold()),
        ),
        probe(
            &config,
            "redis",
            RespPingProbe::new(config.cache.address.clone()).with_timeout(client_timeout(&config)),
            Some(config.cache_threshold()),
        ),
        probe(
            &config,
            "mongodb",
            document_store.clone(),
            config.document_store_threshold(),
        ),
        Arc::new(SystemMetricsCollector::host()),
    );

    // connecting until the driver's first ping lands
    let connection = SharedConnection::new(ConnectionState::Connecting);
    let driver = PingDriver::new(
        Arc::new(document_store),
        connection.clone(),
        Duration::from_secs(config.document_store.liveness_interval_secs),
    )
    .spawn();

    let (notification_tx, notification_rx) = broadcast::channel(64);
    let monitor = MonitorHandle::spawn_with_sender(
        Arc::new(connection),
        config.recovery_poll_interval(),
        notification_tx,
    );

    let notifier = config.notifications.clone().map(|webhook| {
        debug!("forwarding connection notifications to {}", webhook.url);
        NotifierHandle::spawn(NotificationManager::new(webhook, "mongodb"), notification_rx)
    });

    let (snapshot_tx, _) = broadcast::channel(16);
    let poller = config.schedule.as_ref().map(|schedule| {
        PollerHandle::spawn(
            aggregator.clone(),
            Duration::from_secs(schedule.interval_secs),
            snapshot_tx.clone(),
        )
    });

    let state = ApiState::new(aggregator, monitor.clone(), snapshot_tx);
    let addr = spawn_api_server(ApiConfig::from(config.api.clone()), state).await?;
    info!("health endpoint available at http://{addr}/api/v1/health");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    if let Some(poller) = poller {
        poller.shutdown().await?;
    }
    if let Some(notifier) = notifier {
        notifier.shutdown().await?;
    }
    monitor.shutdown().await?;
    driver.shutdown();

    Ok(())
}
