/// One probing pass across every configured host.
///
/// Each host is probed concurrently (mirrors the reference engine's
/// wait-group fan-out); a host fails the tick if the prober reported an
/// error outright or if packet loss exceeded the configured threshold.
/// Every tick writes both the alert state transition and the raw metric
/// samples, regardless of whether anything changed — the Dispatcher, not
/// the Checker, decides what actually gets sent.
use std::sync::Arc;

use reach_core::config::Config;
use reach_core::host::Host;
use reach_core::Clock;
use reach_prober::Prober;
use tracing::{debug, warn};

use crate::alert::AlertStateManager;
use crate::store::{KvStore, Tsdb};

pub struct Checker {
    prober: Arc<dyn Prober>,
    kv: Arc<KvStore>,
    tsdb: Arc<Tsdb>,
    clock: Arc<dyn Clock>,
}

impl Checker {
    pub fn new(
        prober: Arc<dyn Prober>,
        kv: Arc<KvStore>,
        tsdb: Arc<Tsdb>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            prober,
            kv,
            tsdb,
            clock,
        }
    }

    /// Runs one probing pass over `hosts` using the given config snapshot.
    pub async fn run_once(&self, hosts: &[Host], config: &Config) {
        let mut tasks = Vec::with_capacity(hosts.len());
        for host in hosts.iter().cloned() {
            let prober = self.prober.clone();
            let count = config.ping.count;
            let timeout = config.ping.timeout;
            tasks.push(tokio::spawn(async move {
                let output = prober.probe(&host.address, count, timeout).await;
                (host, output)
            }));
        }

        let loss_rate = config.ping.loss_rate;
        let global_fail_alert = config.alert.fail_alert;
        let now_ms = self.clock.now_ms();
        let alert_mgr = AlertStateManager::new(&self.kv, self.clock.as_ref(), config.db.expire);

        for task in tasks {
            let (host, output) = match task.await {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("probe task panicked: {e}");
                    continue;
                }
            };

            let failed = output.error.is_some() || output.loss_percent() > loss_rate;
            let fail_alert = host.fail_alert_override.resolve(global_fail_alert);

            let result = if failed && fail_alert {
                alert_mgr
                    .mark_alert(&host.address, &host.description, fail_alert)
                    .map(|_| ())
            } else if failed {
                debug!(
                    host = %host.address,
                    "failure on host with alerting disabled, not recording an alert"
                );
                Ok(())
            } else {
                alert_mgr.mark_recovered(&host.address).map(|_| ())
            };
            if let Err(e) = result {
                warn!("failed to update alert state for {}: {e}", host.address);
            }

            if let Err(e) = self.tsdb.append_tick(
                &host.address,
                now_ms,
                output.min_ms,
                output.avg_ms,
                output.max_ms,
                output.loss_percent(),
            ) {
                warn!("failed to record metrics for {}: {e}", host.address);
            }

            debug!(
                host = %host.address,
                failed,
                loss = output.loss_percent(),
                "probe tick complete"
            );
        }
    }
}
