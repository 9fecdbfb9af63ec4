/// Periodic consumer of unsent alert rows.
///
/// The only component allowed to call [`AlertStateManager::update_sent`].
/// Runs independently of the Checker's tick rate, on `alert.aggregate_window`,
/// and hands whatever it finds to the configured `AggregatorHandle`.
use std::sync::Arc;

use reach_core::alert::StatusType;
use reach_core::Clock;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::aggregator::AggregatorHandle;
use crate::alert::AlertStateManager;
use crate::store::KvStore;

pub struct Dispatcher {
    kv: Arc<KvStore>,
    clock: Arc<dyn Clock>,
    handler: Arc<dyn AggregatorHandle>,
    alert_ttl_secs: i64,
}

impl Dispatcher {
    pub fn new(
        kv: Arc<KvStore>,
        clock: Arc<dyn Clock>,
        handler: Arc<dyn AggregatorHandle>,
        alert_ttl_secs: i64,
    ) -> Self {
        Self {
            kv,
            clock,
            handler,
            alert_ttl_secs,
        }
    }

    pub async fn run(self: Arc<Self>, window: std::time::Duration, mut stop_rx: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(window);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.process_events(StatusType::Alert).await;
                    self.process_events(StatusType::Recovery).await;
                }
                _ = stop_rx.changed() => {
                    if *stop_rx.borrow() {
                        debug!("stopping alert dispatcher");
                        return;
                    }
                }
            }
        }
    }

    async fn process_events(&self, status_type: StatusType) {
        let alert_mgr = AlertStateManager::new(&self.kv, self.clock.as_ref(), self.alert_ttl_secs);
        let rows = match alert_mgr.list_unsent(status_type) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("failed to fetch unsent {status_type:?} rows: {e}");
                return;
            }
        };
        if rows.is_empty() {
            debug!("no unsent {status_type:?} rows to process");
            return;
        }

        let result = match status_type {
            StatusType::Alert => self.handler.process_alerts(rows, &alert_mgr).await,
            StatusType::Recovery => self.handler.process_recoveries(rows, &alert_mgr).await,
        };
        if let Err(e) = result {
            warn!("failed to process {status_type:?} rows: {e}");
        }
    }
}
