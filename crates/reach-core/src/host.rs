use serde::{Deserialize, Serialize};

/// A configured monitoring target. Identity is `address`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Host {
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "fail_alert")]
    pub fail_alert_override: FailAlertOverride,
}

impl Host {
    pub fn new(address: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            description: description.into(),
            fail_alert_override: FailAlertOverride::Inherit,
        }
    }
}

/// Tri-state override for whether failures on this host should raise an
/// alert. `Inherit` defers to the global `alert.fail_alert` setting.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailAlertOverride {
    #[default]
    Inherit,
    ForceOn,
    ForceOff,
}

impl FailAlertOverride {
    /// Resolve against the global default.
    pub fn resolve(self, global_default: bool) -> bool {
        match self {
            FailAlertOverride::Inherit => global_default,
            FailAlertOverride::ForceOn => true,
            FailAlertOverride::ForceOff => false,
        }
    }
}
