use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use reach_core::clock::SystemClock;
use reach_core::config::Config;
use reach_engine::aggregator::{Aggregator, AggregatorHandle, NoAggregator};
use reach_engine::checker::Checker;
use reach_engine::config::load_config;
use reach_engine::config_watcher::watch_config;
use reach_engine::dispatcher::Dispatcher;
use reach_engine::lifecycle::{spawn_supervised, Lifecycle};
use reach_engine::scheduler::{ScheduleUpdate, Scheduler};
use reach_engine::sinks::{build_sinks, FanOut};
use reach_engine::store::{parse_retention, KvStore, Tsdb};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "reachwatchd", about = "Cross-platform network reachability monitor")]
struct Args {
    /// Path to the YAML config file.
    #[arg(short, long, default_value = "config/reachwatch.yaml", env = "REACHWATCH_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = load_config(&args.config).map_err(|e| {
        tracing::error!("failed to load config {}: {e}", args.config.display());
        e
    })?;

    info!(
        hosts = config.hosts.len(),
        interval_secs = config.effective_interval_secs(),
        "reachwatch starting"
    );

    let clock: Arc<dyn reach_core::Clock> = Arc::new(SystemClock);

    let kv_path = PathBuf::from(&config.db.path).join("kv.sqlite3");
    let tsdb_path = PathBuf::from(&config.db.path).join("tsdb.sqlite3");
    let retention_ms = parse_retention(&config.db.retention)?;
    let kv = Arc::new(KvStore::open(&kv_path)?);
    let tsdb = Arc::new(Tsdb::open(&tsdb_path, retention_ms)?);

    let prober: Arc<dyn reach_prober::Prober> = Arc::from(reach_prober::build_prober());

    let sinks = build_sinks(&config.alert.notifiers);
    if sinks.is_empty() {
        warn!("no notification sinks configured; alerts will only be recorded, not delivered");
    }
    let fan_out = Arc::new(FanOut::new(sinks));
    let handler: Arc<dyn AggregatorHandle> = if config.alert.aggregate_alerts {
        Arc::new(Aggregator::new(
            fan_out,
            config.alert.aggregate_alert_line_template.clone(),
            config.alert.aggregate_recovery_line_template.clone(),
        ))
    } else {
        Arc::new(NoAggregator::new(fan_out))
    };

    let mut lifecycle = Lifecycle::new();

    let checker = Arc::new(Checker::new(
        prober,
        Arc::clone(&kv),
        Arc::clone(&tsdb),
        Arc::clone(&clock),
    ));
    let scheduler = Arc::new(Scheduler::new(Arc::clone(&checker)));
    let (schedule_tx, schedule_rx) = watch::channel(ScheduleUpdate {
        hosts: config.hosts.clone(),
        config: config.clone(),
    });
    lifecycle.track(spawn_supervised("scheduler", {
        let stop_rx = lifecycle.stop_receiver();
        async move { scheduler.run(schedule_rx, stop_rx).await }
    }));

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&kv),
        Arc::clone(&clock),
        handler,
        config.db.expire,
    ));
    let aggregate_window = std::time::Duration::from_secs(config.alert.aggregate_window.max(1));
    lifecycle.track(spawn_supervised("dispatcher", {
        let stop_rx = lifecycle.stop_receiver();
        async move { dispatcher.run(aggregate_window, stop_rx).await }
    }));

    let (config_tx, mut config_rx) = watch::channel(config.clone());
    lifecycle.track(spawn_supervised("config-watcher", {
        let stop_rx = lifecycle.stop_receiver();
        let path = args.config.clone();
        async move { watch_config(path, config_tx, stop_rx).await }
    }));
    lifecycle.track(spawn_supervised("config-reload-forwarder", async move {
        while config_rx.changed().await.is_ok() {
            let new_config = config_rx.borrow().clone();
            let update = ScheduleUpdate {
                hosts: new_config.hosts.clone(),
                config: new_config,
            };
            if schedule_tx.send(update).is_err() {
                break;
            }
        }
    }));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, stopping background tasks");
    lifecycle.shutdown().await;
    Ok(())
}
