use serde::{Deserialize, Serialize};

/// Output of a single probe attempt against one host.
///
/// `error` is set when the probe could not be completed at all (DNS
/// resolution failure, socket error, subprocess failure to launch).
/// Partial packet loss is not an error: `success_count` simply comes
/// back lower than `packet_count`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProbeOutput {
    pub raw_output: String,
    pub success_count: u32,
    pub packet_count: u32,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub error: Option<String>,
}

impl ProbeOutput {
    /// `loss_percent = (packet_count - success_count) / packet_count * 100`.
    /// A probe with zero packets sent is treated as 100% loss.
    pub fn loss_percent(&self) -> f64 {
        if self.packet_count == 0 {
            return 100.0;
        }
        let lost = self.packet_count.saturating_sub(self.success_count) as f64;
        (lost / self.packet_count as f64) * 100.0
    }

    pub fn from_latencies(raw_output: String, packet_count: u32, latencies_ms: &[f64]) -> Self {
        let success_count = latencies_ms.len() as u32;
        let (min_ms, avg_ms, max_ms) = if latencies_ms.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let min = latencies_ms.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = latencies_ms
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max);
            let avg = latencies_ms.iter().sum::<f64>() / latencies_ms.len() as f64;
            (min, avg, max)
        };
        Self {
            raw_output,
            success_count,
            packet_count,
            min_ms,
            avg_ms,
            max_ms,
            error: None,
        }
    }

    pub fn with_error(packet_count: u32, error: impl Into<String>) -> Self {
        Self {
            raw_output: String::new(),
            success_count: 0,
            packet_count,
            min_ms: 0.0,
            avg_ms: 0.0,
            max_ms: 0.0,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_percent_at_threshold_is_not_failure_by_itself() {
        let out = ProbeOutput {
            packet_count: 10,
            success_count: 8,
            ..Default::default()
        };
        assert_eq!(out.loss_percent(), 20.0);
    }

    #[test]
    fn zero_packets_is_full_loss() {
        let out = ProbeOutput::default();
        assert_eq!(out.loss_percent(), 100.0);
    }

    #[test]
    fn from_latencies_computes_min_avg_max() {
        let out = ProbeOutput::from_latencies("ok".into(), 4, &[10.0, 20.0, 30.0]);
        assert_eq!(out.success_count, 3);
        assert_eq!(out.min_ms, 10.0);
        assert_eq!(out.max_ms, 30.0);
        assert!((out.avg_ms - 20.0).abs() < f64::EPSILON);
    }
}
