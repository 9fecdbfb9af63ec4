/// Periodic ping-check driver.
///
/// Mirrors the reference scheduler: a ticker drives `Checker::run_once` on a
/// fixed period, a control channel lets the config watcher push a new period
/// in without restarting the task, and a stop channel tears the loop down on
/// shutdown. Hosts are passed through the same channel as the interval so a
/// reload can add or remove monitoring targets without a restart either.
use std::sync::Arc;
use std::time::Duration;

use reach_core::config::Config;
use reach_core::host::Host;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::checker::Checker;

/// What the config watcher pushes into a running scheduler.
#[derive(Debug, Clone)]
pub struct ScheduleUpdate {
    pub hosts: Vec<Host>,
    pub config: Config,
}

pub struct Scheduler {
    checker: Arc<Checker>,
}

impl Scheduler {
    pub fn new(checker: Arc<Checker>) -> Self {
        Self { checker }
    }

    /// Runs the tick loop until `stop_rx` fires. `updates` starts with the
    /// current config and yields again on every hot reload.
    pub async fn run(
        self: Arc<Self>,
        mut updates: watch::Receiver<ScheduleUpdate>,
        mut stop_rx: watch::Receiver<bool>,
    ) {
        let mut current = updates.borrow().clone();
        let mut ticker = tokio::time::interval(interval_duration(&current.config));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            interval_secs = current.config.effective_interval_secs(),
            hosts = current.hosts.len(),
            "starting periodic ping checks"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("executing scheduled ping check");
                    self.checker.run_once(&current.hosts, &current.config).await;
                }
                changed = updates.changed() => {
                    if changed.is_err() {
                        continue;
                    }
                    let next = updates.borrow().clone();
                    let restart_ticker = next.config.effective_interval_secs()
                        != current.config.effective_interval_secs();
                    current = next;
                    if restart_ticker {
                        info!(
                            interval_secs = current.config.effective_interval_secs(),
                            "updated ping check interval"
                        );
                        ticker = tokio::time::interval(interval_duration(&current.config));
                        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                    } else {
                        debug!("config reloaded without an interval change");
                    }
                }
                _ = stop_rx.changed() => {
                    if *stop_rx.borrow() {
                        info!("stopping periodic ping checks");
                        return;
                    }
                }
            }
        }
    }
}

fn interval_duration(config: &Config) -> Duration {
    Duration::from_secs(config.effective_interval_secs().max(1))
}
