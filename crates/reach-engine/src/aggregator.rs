/// The two ways unsent alert rows can be turned into outbound notifications.
///
/// `Aggregator` batches every unsent row from one Dispatcher pass into a
/// single aggregated call per sink; `NoAggregator` sends one notification
/// per row. Both only mark a row `sent` after the corresponding send
/// succeeds, and both are driven exclusively by the Dispatcher.
use async_trait::async_trait;
use reach_core::alert::AlertStatus;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::alert::AlertStateManager;
use crate::sinks::Sink;

#[async_trait]
pub trait AggregatorHandle: Send + Sync {
    async fn process_alerts(
        &self,
        alerts: Vec<AlertStatus>,
        alert_mgr: &AlertStateManager<'_>,
    ) -> anyhow::Result<()>;

    async fn process_recoveries(
        &self,
        recoveries: Vec<AlertStatus>,
        alert_mgr: &AlertStateManager<'_>,
    ) -> anyhow::Result<()>;
}

/// Batches an entire Dispatcher pass into one aggregated notification per
/// sink. `alert_line_template`/`recovery_line_template` drive only the
/// debug-log rendering of the batch; the wire format for each sink is
/// still governed by that sink's own per-notifier templates.
pub struct Aggregator {
    sink: Arc<dyn Sink>,
    alert_line_template: String,
    recovery_line_template: String,
}

impl Aggregator {
    pub fn new(sink: Arc<dyn Sink>, alert_line_template: String, recovery_line_template: String) -> Self {
        Self {
            sink,
            alert_line_template,
            recovery_line_template,
        }
    }

    fn format_lines(&self, alerts: &[AlertStatus], is_recovery: bool) -> String {
        let template = if is_recovery {
            &self.recovery_line_template
        } else {
            &self.alert_line_template
        };
        alerts
            .iter()
            .map(|a| {
                template
                    .replace("{{.Host}}", &a.host)
                    .replace("{{.Description}}", &a.description)
                    .replace("{{.FailTime}}", &a.fail_time)
                    .replace("{{.RecoveryTime}}", &a.recovery_time)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl AggregatorHandle for Aggregator {
    async fn process_alerts(
        &self,
        alerts: Vec<AlertStatus>,
        alert_mgr: &AlertStateManager<'_>,
    ) -> anyhow::Result<()> {
        if alerts.is_empty() {
            return Ok(());
        }
        debug!("sending aggregated alerts:\n{}", self.format_lines(&alerts, false));
        self.sink.send_aggregated_notification(&alerts, false).await?;
        for alert in &alerts {
            if let Err(e) = alert_mgr.update_sent(&alert.host, true) {
                warn!("failed to mark alert sent for {}: {e}", alert.host);
            }
        }
        Ok(())
    }

    async fn process_recoveries(
        &self,
        recoveries: Vec<AlertStatus>,
        alert_mgr: &AlertStateManager<'_>,
    ) -> anyhow::Result<()> {
        if recoveries.is_empty() {
            return Ok(());
        }
        debug!(
            "sending aggregated recoveries:\n{}",
            self.format_lines(&recoveries, true)
        );
        self.sink.send_aggregated_notification(&recoveries, true).await?;
        for alert in &recoveries {
            if let Err(e) = alert_mgr.update_sent(&alert.host, true) {
                warn!("failed to mark recovery sent for {}: {e}", alert.host);
            }
        }
        Ok(())
    }
}

/// Sends one notification per row, independently. A failing send just
/// skips that row's `update_sent` — it stays unsent and is retried on the
/// next Dispatcher pass.
pub struct NoAggregator {
    sink: Arc<dyn Sink>,
}

impl NoAggregator {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl AggregatorHandle for NoAggregator {
    async fn process_alerts(
        &self,
        alerts: Vec<AlertStatus>,
        alert_mgr: &AlertStateManager<'_>,
    ) -> anyhow::Result<()> {
        for alert in alerts {
            debug!("sending alert for host: {}", alert.host);
            match self.sink.send_notification(&alert).await {
                Ok(()) => {
                    if let Err(e) = alert_mgr.update_sent(&alert.host, true) {
                        warn!("failed to update sent status for {}: {e}", alert.host);
                    }
                }
                Err(e) => warn!("failed to send alert for {}: {e}", alert.host),
            }
        }
        Ok(())
    }

    async fn process_recoveries(
        &self,
        recoveries: Vec<AlertStatus>,
        alert_mgr: &AlertStateManager<'_>,
    ) -> anyhow::Result<()> {
        for alert in recoveries {
            debug!("sending recovery for host: {}", alert.host);
            match self.sink.send_recovery_notification(&alert).await {
                Ok(()) => {
                    if let Err(e) = alert_mgr.update_sent(&alert.host, true) {
                        warn!("failed to update sent status for {}: {e}", alert.host);
                    }
                }
                Err(e) => warn!("failed to send recovery for {}: {e}", alert.host),
            }
        }
        Ok(())
    }
}
