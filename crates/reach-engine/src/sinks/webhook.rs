/// Generic webhook sink: posts a JSON payload to a configured URL.
///
/// Grounded on the reference engine's Feishu notifier — same
/// `{{.Host}}`/`{{.Description}}`/`{{.FailTime}}`/`{{.RecoveryTime}}`
/// placeholder substitution, same `msg_type` field driving payload shape.
/// Only `msg_type: text` is implemented; `post` and `interactive` are
/// richer Feishu card formats the reference engine also exposed, left
/// unimplemented here pending a concrete card-template design.
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reach_core::alert::AlertStatus;
use serde::{Deserialize, Serialize};

use super::Sink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MsgType {
    Text,
    Post,
    Interactive,
}

pub struct WebhookSink {
    client: reqwest::Client,
    webhook_url: String,
    msg_type: MsgType,
    alert_template: String,
    recovery_template: String,
}

#[derive(Serialize)]
struct TextMessage<'a> {
    msg_type: &'a str,
    content: TextContent,
}

#[derive(Serialize)]
struct TextContent {
    text: String,
}

/// Webhook backends in this family answer HTTP 200 even on an
/// application-level rejection; `code` is the real success signal.
#[derive(Deserialize)]
struct WebhookResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

impl WebhookSink {
    pub fn from_options(options: &HashMap<String, serde_yaml::Value>) -> anyhow::Result<Self> {
        let webhook_url = options
            .get("webhook")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("webhook notifier requires a `webhook` URL"))?
            .to_string();

        let msg_type = match options.get("msg_type").and_then(|v| v.as_str()) {
            None | Some("text") => MsgType::Text,
            Some("post") => MsgType::Post,
            Some("interactive") => MsgType::Interactive,
            Some(other) => anyhow::bail!("unsupported webhook msg_type: {other}"),
        };
        if msg_type != MsgType::Text {
            anyhow::bail!("webhook msg_type '{msg_type:?}' is not yet implemented");
        }

        let alert_template = options
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or("{{.Host}} ({{.Description}}) has been unreachable since {{.FailTime}}")
            .to_string();
        let recovery_template = options
            .get("recovery_content")
            .and_then(|v| v.as_str())
            .unwrap_or("{{.Host}} ({{.Description}}) recovered at {{.RecoveryTime}}")
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            webhook_url,
            msg_type,
            alert_template,
            recovery_template,
        })
    }

    async fn post_text(&self, text: String) -> anyhow::Result<()> {
        let msg = TextMessage {
            msg_type: "text",
            content: TextContent { text },
        };
        let resp = self.client.post(&self.webhook_url).json(&msg).send().await?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("webhook returned status {status}");
        }
        let body: WebhookResponse = resp.json().await?;
        if body.code != 0 {
            anyhow::bail!("webhook rejected notification: code={} msg={}", body.code, body.msg);
        }
        Ok(())
    }
}

fn render(template: &str, alert: &AlertStatus) -> String {
    template
        .replace("{{.Host}}", &alert.host)
        .replace("{{.Description}}", &alert.description)
        .replace("{{.FailTime}}", &alert.fail_time)
        .replace("{{.RecoveryTime}}", &alert.recovery_time)
}

#[async_trait]
impl Sink for WebhookSink {
    async fn send_notification(&self, alert: &AlertStatus) -> anyhow::Result<()> {
        self.post_text(render(&self.alert_template, alert)).await
    }

    async fn send_recovery_notification(&self, alert: &AlertStatus) -> anyhow::Result<()> {
        self.post_text(render(&self.recovery_template, alert)).await
    }

    async fn send_aggregated_notification(
        &self,
        alerts: &[AlertStatus],
        is_recovery: bool,
    ) -> anyhow::Result<()> {
        let template = if is_recovery {
            &self.recovery_template
        } else {
            &self.alert_template
        };
        let body = alerts
            .iter()
            .map(|a| render(template, a))
            .collect::<Vec<_>>()
            .join("\n");
        self.post_text(body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reach_core::alert::StatusType;

    fn sample_alert() -> AlertStatus {
        AlertStatus {
            host: "10.0.0.1".to_string(),
            description: "core switch".to_string(),
            fail_alert: true,
            status: StatusType::Alert,
            fail_time: "2026-01-01T00:00:00Z".to_string(),
            recovery_time: String::new(),
            sent: false,
        }
    }

    #[test]
    fn render_substitutes_all_placeholders() {
        let alert = sample_alert();
        let rendered = render(
            "{{.Host}} ({{.Description}}) down since {{.FailTime}}",
            &alert,
        );
        assert_eq!(rendered, "10.0.0.1 (core switch) down since 2026-01-01T00:00:00Z");
    }

    #[test]
    fn from_options_rejects_unimplemented_msg_type() {
        let mut options = HashMap::new();
        options.insert(
            "webhook".to_string(),
            serde_yaml::Value::String("https://example.com/hook".to_string()),
        );
        options.insert(
            "msg_type".to_string(),
            serde_yaml::Value::String("interactive".to_string()),
        );
        assert!(WebhookSink::from_options(&options).is_err());
    }

    #[test]
    fn from_options_requires_webhook_url() {
        let options = HashMap::new();
        assert!(WebhookSink::from_options(&options).is_err());
    }
}
