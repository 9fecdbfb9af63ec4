use std::net::IpAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::random;
use reach_core::ProbeOutput;
use surge_ping::{Client, Config as PingConfig, PingIdentifier, PingSequence, SurgeError};

use crate::Prober;

/// Raw ICMP echo prober, used when the process holds the privilege to
/// open an ICMP datagram socket directly (root on Unix, an elevated
/// token on Windows). Sends `count` echoes at 1s spacing and waits up
/// to `timeout` for each reply individually — failures on one packet do
/// not cancel the remaining ones.
pub struct PrivilegedProber {
    client_v4: Client,
}

impl PrivilegedProber {
    pub fn new() -> Self {
        let client_v4 =
            Client::new(&PingConfig::default()).expect("failed to open ICMP v4 client socket");
        Self { client_v4 }
    }
}

impl Default for PrivilegedProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for PrivilegedProber {
    async fn probe(&self, host: &str, count: u32, timeout_secs: u64) -> ProbeOutput {
        let addr: IpAddr = match resolve(host) {
            Ok(addr) => addr,
            Err(e) => return ProbeOutput::with_error(count, e),
        };

        let identifier = PingIdentifier(random());
        let mut pinger = self.client_v4.pinger(addr, identifier).await;
        pinger.timeout(Duration::from_secs(timeout_secs.max(1)));

        let payload = [0u8; 56];
        let mut latencies = Vec::with_capacity(count as usize);
        let mut raw = String::new();

        for seq in 0..count {
            let start = Instant::now();
            match pinger.ping(PingSequence(seq as u16), &payload).await {
                Ok((_packet, rtt)) => {
                    let ms = rtt.as_secs_f64() * 1000.0;
                    latencies.push(ms);
                    raw.push_str(&format!("reply from {addr}: time={ms:.2}ms\n"));
                }
                Err(SurgeError::Timeout { .. }) => {
                    raw.push_str(&format!("request timeout for icmp_seq {seq}\n"));
                }
                Err(e) => {
                    raw.push_str(&format!("icmp_seq {seq} failed: {e}\n"));
                }
            }

            if seq + 1 < count {
                let elapsed = start.elapsed();
                let spacing = Duration::from_secs(1).saturating_sub(elapsed);
                if !spacing.is_zero() {
                    tokio::time::sleep(spacing).await;
                }
            }
        }

        ProbeOutput::from_latencies(raw, count, &latencies)
    }
}

/// Resolves to IPv4 only, matching the reference engine's "ip4"-only
/// resolution — the privileged client above is opened for ICMPv4.
fn resolve(host: &str) -> Result<IpAddr, String> {
    if let Ok(IpAddr::V4(addr)) = host.parse::<IpAddr>() {
        return Ok(IpAddr::V4(addr));
    }
    use std::net::ToSocketAddrs;
    (host, 0)
        .to_socket_addrs()
        .map_err(|e| format!("failed to resolve host {host}: {e}"))?
        .find_map(|sa| match sa.ip() {
            IpAddr::V4(v4) => Some(IpAddr::V4(v4)),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| format!("no IPv4 address found for host {host}"))
}
