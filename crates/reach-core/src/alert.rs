use serde::{Deserialize, Serialize};

/// Durable per-host alert row, mirrored 1:1 in the KV store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertStatus {
    pub host: String,
    pub description: String,
    pub fail_alert: bool,
    pub status: StatusType,
    /// RFC3339 timestamp of the first failure in the current incident.
    /// Empty in a row that has never seen an ALERT transition.
    #[serde(default)]
    pub fail_time: String,
    /// RFC3339 timestamp of the most recent recovery. Empty until recovered.
    #[serde(default)]
    pub recovery_time: String,
    pub sent: bool,
}

impl AlertStatus {
    pub fn key(host: &str) -> String {
        format!("alert_status:{host}")
    }

    pub fn key_prefix() -> &'static str {
        "alert_status:"
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusType {
    Alert,
    Recovery,
}
