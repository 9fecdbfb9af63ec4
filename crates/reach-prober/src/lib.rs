//! Platform ICMP probing.
//!
//! Three concrete variants, selected once at construction by
//! [`build_prober`]:
//!
//!   - [`privileged::PrivilegedProber`] sends raw ICMP echo requests
//!     directly; requires elevated privileges.
//!   - [`command_unix::CommandProber`] shells out to the system `ping`
//!     on Linux/macOS.
//!   - [`command_windows::CommandProber`] shells out to `ping.exe` on
//!     Windows, decoding the console's GBK-encoded output.
//!
//! None of these retry or back off — that is Checker policy, not probe
//! policy.

mod command_unix;
#[cfg(windows)]
mod command_windows;
mod parse;
mod privileged;
mod privilege;

use async_trait::async_trait;
use reach_core::ProbeOutput;

/// Capability for measuring loss + latency against one host.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, host: &str, count: u32, timeout_secs: u64) -> ProbeOutput;
}

/// Pick the privileged raw-ICMP prober when the process has the
/// capability to open raw sockets, otherwise fall back to shelling out
/// to the platform's `ping` binary.
pub fn build_prober() -> Box<dyn Prober> {
    if privilege::has_raw_socket_privilege() {
        tracing::info!("running with raw socket privilege, using privileged ICMP prober");
        Box::new(privileged::PrivilegedProber::new())
    } else {
        tracing::info!("no raw socket privilege, shelling out to the system ping command");
        build_command_prober()
    }
}

#[cfg(windows)]
fn build_command_prober() -> Box<dyn Prober> {
    Box::new(command_windows::CommandProber::new())
}

#[cfg(not(windows))]
fn build_command_prober() -> Box<dyn Prober> {
    Box::new(command_unix::CommandProber::new())
}
