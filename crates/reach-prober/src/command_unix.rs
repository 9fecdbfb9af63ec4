use async_trait::async_trait;
use reach_core::ProbeOutput;
use tokio::process::Command;

use crate::parse::parse_ping_output;
use crate::Prober;

/// Shells out to the system `ping` binary on Linux/Darwin:
/// `ping -c <count> -W <timeout> <host>`.
pub struct CommandProber;

impl CommandProber {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CommandProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for CommandProber {
    async fn probe(&self, host: &str, count: u32, timeout_secs: u64) -> ProbeOutput {
        let output = Command::new("ping")
            .arg("-c")
            .arg(count.to_string())
            .arg("-W")
            .arg(timeout_secs.to_string())
            .arg(host)
            .output()
            .await;

        match output {
            Ok(out) => {
                let text = String::from_utf8_lossy(&out.stdout).into_owned();
                if text.trim().is_empty() && !out.status.success() {
                    let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
                    return ProbeOutput::with_error(count, format!("ping failed: {stderr}"));
                }
                parse_ping_output(&text, count)
            }
            Err(e) => ProbeOutput::with_error(count, format!("failed to spawn ping: {e}")),
        }
    }
}
