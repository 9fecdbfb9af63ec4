use regex::Regex;
use reach_core::ProbeOutput;
use std::sync::OnceLock;

fn latency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Matches both "time=12.3 ms" (Linux/macOS) and "time=12ms"/"time<1ms" (Windows).
    RE.get_or_init(|| Regex::new(r"time[=<]([0-9]+(?:\.[0-9]+)?)\s*ms").unwrap())
}

/// Parse the textual summary of a `ping` invocation into a [`ProbeOutput`].
/// One latency sample is extracted per successful reply line; `count` is
/// the number of packets that were requested (not necessarily received).
pub fn parse_ping_output(raw_output: &str, count: u32) -> ProbeOutput {
    let latencies: Vec<f64> = latency_re()
        .captures_iter(raw_output)
        .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
        .collect();

    ProbeOutput::from_latencies(raw_output.to_string(), count, &latencies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_linux_style_output() {
        let raw = "64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=11.2 ms\n\
                    64 bytes from 10.0.0.1: icmp_seq=2 ttl=64 time=12.8 ms\n\
                    --- 10.0.0.1 ping statistics ---\n\
                    2 packets transmitted, 2 received, 0% packet loss, time 1001ms";
        let out = parse_ping_output(raw, 2);
        assert_eq!(out.success_count, 2);
        assert!((out.min_ms - 11.2).abs() < 1e-9);
        assert!((out.max_ms - 12.8).abs() < 1e-9);
    }

    #[test]
    fn parses_windows_style_output() {
        let raw = "Reply from 10.0.0.1: bytes=32 time=14ms TTL=64\n\
                    Reply from 10.0.0.1: bytes=32 time<1ms TTL=64";
        let out = parse_ping_output(raw, 2);
        assert_eq!(out.success_count, 2);
        assert_eq!(out.max_ms, 14.0);
    }

    #[test]
    fn no_replies_yields_zeroed_stats() {
        let raw = "Request timeout for icmp_seq 1\nRequest timeout for icmp_seq 2";
        let out = parse_ping_output(raw, 2);
        assert_eq!(out.success_count, 0);
        assert_eq!(out.min_ms, 0.0);
        assert_eq!(out.loss_percent(), 100.0);
    }
}
