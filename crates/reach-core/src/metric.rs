use serde::{Deserialize, Serialize};

/// A single labeled numeric sample appended to the TSDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp_ms: i64,
    pub value: f64,
    pub name: MetricName,
    pub host: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    MinLatency,
    AvgLatency,
    MaxLatency,
    PacketLoss,
}

impl MetricName {
    pub const ALL: [MetricName; 4] = [
        MetricName::MinLatency,
        MetricName::AvgLatency,
        MetricName::MaxLatency,
        MetricName::PacketLoss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::MinLatency => "min_latency",
            MetricName::AvgLatency => "avg_latency",
            MetricName::MaxLatency => "max_latency",
            MetricName::PacketLoss => "packet_loss",
        }
    }
}

impl std::fmt::Display for MetricName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
