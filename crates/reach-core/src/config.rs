use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::host::Host;

/// The full on-disk configuration. Deserialized directly from YAML;
/// unknown keys inside a notifier's `options` map are preserved verbatim
/// and handed to that notifier's factory untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default)]
    pub ping: PingConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            interval: default_interval(),
            ping: PingConfig::default(),
            alert: AlertConfig::default(),
            db: DbConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Scheduler period: `ping.interval` overrides `interval` when set.
    pub fn effective_interval_secs(&self) -> u64 {
        if self.ping.interval > 0 {
            self.ping.interval
        } else {
            self.interval
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.hosts.is_empty() {
            return Err("config has no hosts to monitor".into());
        }
        if self.ping.count == 0 {
            return Err("ping.count must be > 0".into());
        }
        if self.effective_interval_secs() == 0 {
            return Err("interval (or ping.interval) must be > 0".into());
        }
        Ok(())
    }
}

fn default_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PingConfig {
    #[serde(default)]
    pub interval: u64,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_loss_rate")]
    pub loss_rate: f64,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            interval: 0,
            count: default_count(),
            timeout: default_timeout(),
            loss_rate: default_loss_rate(),
        }
    }
}

fn default_count() -> u32 {
    4
}
fn default_timeout() -> u64 {
    2
}
fn default_loss_rate() -> f64 {
    20.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertConfig {
    #[serde(default)]
    pub fail_alert: bool,
    #[serde(default)]
    pub aggregate_alerts: bool,
    #[serde(default = "default_aggregate_window")]
    pub aggregate_window: u64,
    #[serde(default = "default_alert_line_template")]
    pub aggregate_alert_line_template: String,
    #[serde(default = "default_recovery_line_template")]
    pub aggregate_recovery_line_template: String,
    #[serde(default)]
    pub notifiers: Vec<NotifierConfig>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            fail_alert: true,
            aggregate_alerts: false,
            aggregate_window: default_aggregate_window(),
            aggregate_alert_line_template: default_alert_line_template(),
            aggregate_recovery_line_template: default_recovery_line_template(),
            notifiers: Vec::new(),
        }
    }
}

fn default_aggregate_window() -> u64 {
    60
}

fn default_alert_line_template() -> String {
    "{{.Host}} ({{.Description}}) has been unreachable since {{.FailTime}}".to_string()
}

fn default_recovery_line_template() -> String {
    "{{.Host}} ({{.Description}}) recovered at {{.RecoveryTime}}".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotifierConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_enable")]
    pub enable: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: HashMap<String, serde_yaml::Value>,
}

fn default_enable() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_expire")]
    pub expire: i64,
    #[serde(default = "default_retention")]
    pub retention: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            expire: default_expire(),
            retention: default_retention(),
        }
    }
}

fn default_db_path() -> String {
    "./data".to_string()
}
fn default_expire() -> i64 {
    86400
}
fn default_retention() -> String {
    "7d".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_size")]
    pub max_size_mb: u64,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default)]
    pub compress: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            max_size_mb: default_max_size(),
            max_backups: default_max_backups(),
            compress: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_size() -> u64 {
    10
}
fn default_max_backups() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_interval_prefers_ping_interval_when_set() {
        let mut cfg = Config {
            interval: 30,
            ..Default::default()
        };
        cfg.ping.interval = 5;
        assert_eq!(cfg.effective_interval_secs(), 5);
        cfg.ping.interval = 0;
        assert_eq!(cfg.effective_interval_secs(), 30);
    }

    #[test]
    fn validate_rejects_empty_hosts() {
        let cfg = Config::default();
        assert!(cfg.validate().is_err());
    }
}
