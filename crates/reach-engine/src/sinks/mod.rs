/// Notification sinks and the registry that builds them from config.
///
/// Mirrors the reference engine's notifier registry: each sink `kind` maps
/// to a constructor, `build_sinks` walks the configured (and enabled)
/// notifier list and instantiates one `Sink` per entry, and `FanOut` wraps
/// the resulting list so the Dispatcher can treat "every configured sink"
/// as a single `Sink` — a failing sink is logged and skipped rather than
/// aborting delivery to the others.
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use reach_core::alert::AlertStatus;
use reach_core::config::NotifierConfig;
use tracing::{error, warn};

#[async_trait]
pub trait Sink: Send + Sync {
    async fn send_notification(&self, alert: &AlertStatus) -> anyhow::Result<()>;
    async fn send_recovery_notification(&self, alert: &AlertStatus) -> anyhow::Result<()>;
    async fn send_aggregated_notification(
        &self,
        alerts: &[AlertStatus],
        is_recovery: bool,
    ) -> anyhow::Result<()>;
}

/// Builds one sink per enabled, recognized entry in `notifiers`. An unknown
/// `kind` or a constructor failure is logged and the entry is skipped —
/// one bad notifier config must not keep the others from loading.
pub fn build_sinks(notifiers: &[NotifierConfig]) -> Vec<Arc<dyn Sink>> {
    let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();
    for cfg in notifiers {
        if !cfg.enable {
            warn!(notifier = %cfg.name, "notifier disabled, skipping");
            continue;
        }
        let built = match cfg.kind.as_str() {
            "webhook" => webhook::WebhookSink::from_options(&cfg.options)
                .map(|s| Arc::new(s) as Arc<dyn Sink>),
            other => {
                error!(kind = other, notifier = %cfg.name, "unknown notifier type");
                continue;
            }
        };
        match built {
            Ok(sink) => sinks.push(sink),
            Err(e) => error!(notifier = %cfg.name, "failed to initialize notifier: {e}"),
        }
    }
    sinks
}

/// Forwards every call to all wrapped sinks concurrently. Errors from
/// individual sinks are logged; the fan-out only returns `Err` when every
/// sink failed, so one unreachable webhook can't mask delivery to the rest.
pub struct FanOut {
    sinks: Vec<Arc<dyn Sink>>,
}

impl FanOut {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl Sink for FanOut {
    async fn send_notification(&self, alert: &AlertStatus) -> anyhow::Result<()> {
        fan_out(&self.sinks, |s| {
            let alert = alert.clone();
            async move { s.send_notification(&alert).await }
        })
        .await
    }

    async fn send_recovery_notification(&self, alert: &AlertStatus) -> anyhow::Result<()> {
        fan_out(&self.sinks, |s| {
            let alert = alert.clone();
            async move { s.send_recovery_notification(&alert).await }
        })
        .await
    }

    async fn send_aggregated_notification(
        &self,
        alerts: &[AlertStatus],
        is_recovery: bool,
    ) -> anyhow::Result<()> {
        fan_out(&self.sinks, |s| {
            let alerts = alerts.to_vec();
            async move { s.send_aggregated_notification(&alerts, is_recovery).await }
        })
        .await
    }
}

async fn fan_out<F, Fut>(sinks: &[Arc<dyn Sink>], call: F) -> anyhow::Result<()>
where
    F: Fn(Arc<dyn Sink>) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
{
    if sinks.is_empty() {
        return Ok(());
    }
    let handles: Vec<_> = sinks
        .iter()
        .cloned()
        .map(|sink| tokio::spawn(call(sink)))
        .collect();

    let mut failed = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => failed.push(e.to_string()),
            Err(e) => failed.push(format!("sink task panicked: {e}")),
        }
    }
    if failed.len() == sinks.len() {
        anyhow::bail!("all sinks failed: {}", failed.join("; "));
    }
    for msg in &failed {
        error!("sink delivery failed: {msg}");
    }
    Ok(())
}
