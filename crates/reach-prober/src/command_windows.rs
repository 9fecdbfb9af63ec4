use async_trait::async_trait;
use encoding_rs::GBK;
use reach_core::ProbeOutput;
use tokio::process::Command;

use crate::parse::parse_ping_output;
use crate::Prober;

/// Windows `CREATE_NO_WINDOW`, so the spawned `ping.exe` doesn't flash a
/// console window when the engine runs as a service.
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Shells out to `ping.exe`: `ping -n <count> -w <timeout_ms> <host>`.
/// The console codepage on non-English Windows installs is typically
/// GBK (936) rather than UTF-8, so stdout is decoded accordingly before
/// the shared parser runs over it.
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
        use std::os::windows::process::CommandExt;

        let timeout_ms = timeout_secs.saturating_mul(1000);
        let output = Command::new("ping")
            .arg("-n")
            .arg(count.to_string())
            .arg("-w")
            .arg(timeout_ms.to_string())
            .arg(host)
            .creation_flags(CREATE_NO_WINDOW)
            .output()
            .await;

        match output {
            Ok(out) => {
                let (text, _, _) = GBK.decode(&out.stdout);
                let text = text.into_owned();
                if text.trim().is_empty() && !out.status.success() {
                    let (stderr, _, _) = GBK.decode(&out.stderr);
                    return ProbeOutput::with_error(count, format!("ping failed: {stderr}"));
                }
                parse_ping_output(&text, count)
            }
            Err(e) => ProbeOutput::with_error(count, format!("failed to spawn ping: {e}")),
        }
    }
}
