/// Read-side API consumed by `reach-cli` and any other collaborator: host
/// listing, latest status per host, and step-adapted historical series.
use std::collections::HashMap;

use reach_core::alert::{AlertStatus, StatusType};
use reach_core::host::Host;
use reach_core::metric::MetricName;
use reach_core::Clock;
use serde::Serialize;

use crate::alert::AlertStateManager;
use crate::store::{Tsdb, TimeSeriesPoint};

/// Point budget for a single range query; the step is widened until the
/// series fits, the same trade-off a ranged Prometheus query makes.
const MAX_POINTS_PER_SERIES: i64 = 1440;

/// Step ladder in seconds. `pick_step` walks it until `range/step` fits the
/// point budget, then aligns to that step's grid.
const STEP_LADDER_SECS: &[i64] = &[
    1, 2, 5, 10, 15, 30, 60, 120, 300, 600, 900, 1800, 3600, 7200, 21600, 43200, 86400,
];

/// Picks the narrowest step from [`STEP_LADDER_SECS`] such that the number
/// of points in `[start_ms, end_ms]` stays within [`MAX_POINTS_PER_SERIES`],
/// floored at `probe_interval_secs` — a step narrower than the actual
/// sampling rate would just repeat the same sample, so it's never worth it.
/// Falls back to the widest rung (or the floor, if that's wider) if even the
/// widest rung doesn't fit the point budget.
pub fn pick_step(start_ms: i64, end_ms: i64, probe_interval_secs: i64) -> i64 {
    let range_secs = ((end_ms - start_ms).max(0) / 1000).max(1);
    let floor_secs = probe_interval_secs.max(1);
    let mut widest_eligible = floor_secs;
    for &step in STEP_LADDER_SECS {
        if step < floor_secs {
            continue;
        }
        widest_eligible = step;
        if range_secs / step <= MAX_POINTS_PER_SERIES {
            return step * 1000;
        }
    }
    widest_eligible.max(floor_secs) * 1000
}

#[derive(Debug, Clone, Serialize)]
pub struct HostStatusData {
    pub host: String,
    pub min_latency: f64,
    pub avg_latency: f64,
    pub max_latency: f64,
    pub packet_loss: f64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostRangeData {
    pub host: String,
    pub series: HashMap<String, Vec<SeriesPoint>>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeriesPoint {
    pub timestamp: i64,
    pub value: f64,
}

impl From<TimeSeriesPoint> for SeriesPoint {
    fn from(p: TimeSeriesPoint) -> Self {
        Self {
            timestamp: p.timestamp_ms,
            value: p.value,
        }
    }
}

pub struct QueryApi<'a> {
    kv: &'a crate::store::KvStore,
    tsdb: &'a Tsdb,
    clock: &'a dyn Clock,
    alert_ttl_secs: i64,
    probe_interval_secs: i64,
}

impl<'a> QueryApi<'a> {
    pub fn new(
        kv: &'a crate::store::KvStore,
        tsdb: &'a Tsdb,
        clock: &'a dyn Clock,
        alert_ttl_secs: i64,
        probe_interval_secs: i64,
    ) -> Self {
        Self {
            kv,
            tsdb,
            clock,
            alert_ttl_secs,
            probe_interval_secs,
        }
    }

    pub fn list_hosts(&self, hosts: &[Host]) -> Vec<Host> {
        hosts.to_vec()
    }

    /// Current status for each host: latest metric samples plus ALERT /
    /// RECOVERY / unknown derived from the alert store.
    pub fn status_with_hosts(&self, hosts: &[Host]) -> anyhow::Result<Vec<HostStatusData>> {
        let addresses: Vec<String> = hosts.iter().map(|h| h.address.clone()).collect();
        let now_ms = self.clock.now_ms();

        let min = self.tsdb.query_latest(&addresses, MetricName::MinLatency, now_ms)?;
        let avg = self.tsdb.query_latest(&addresses, MetricName::AvgLatency, now_ms)?;
        let max = self.tsdb.query_latest(&addresses, MetricName::MaxLatency, now_ms)?;
        let loss = self.tsdb.query_latest(&addresses, MetricName::PacketLoss, now_ms)?;

        let alert_mgr = AlertStateManager::new(self.kv, self.clock, self.alert_ttl_secs);

        let mut out = Vec::with_capacity(hosts.len());
        for host in hosts {
            let status = match alert_mgr.get(&host.address)? {
                Some(AlertStatus { status, .. }) => format!("{status:?}").to_uppercase(),
                None => "UNKNOWN".to_string(),
            };
            out.push(HostStatusData {
                host: host.address.clone(),
                min_latency: min.get(&host.address).copied().unwrap_or_default(),
                avg_latency: avg.get(&host.address).copied().unwrap_or_default(),
                max_latency: max.get(&host.address).copied().unwrap_or_default(),
                packet_loss: loss.get(&host.address).copied().unwrap_or_default(),
                status,
            });
        }
        Ok(out)
    }

    /// Historical series for each host across every metric, step-adapted to
    /// the requested window.
    pub fn history_with_hosts(
        &self,
        hosts: &[Host],
        start_ms: i64,
        end_ms: i64,
    ) -> anyhow::Result<Vec<HostRangeData>> {
        let addresses: Vec<String> = hosts.iter().map(|h| h.address.clone()).collect();
        let step_ms = pick_step(start_ms, end_ms, self.probe_interval_secs);

        let mut per_metric = HashMap::new();
        for metric in MetricName::ALL {
            let series = self
                .tsdb
                .query_range(&addresses, metric, start_ms, end_ms, step_ms)?;
            per_metric.insert(metric, series);
        }

        let mut out = Vec::with_capacity(hosts.len());
        for host in hosts {
            let mut series = HashMap::new();
            for metric in MetricName::ALL {
                if let Some(points) = per_metric.get(&metric).and_then(|m| m.get(&host.address)) {
                    series.insert(
                        metric.as_str().to_string(),
                        points.iter().copied().map(SeriesPoint::from).collect(),
                    );
                }
            }
            out.push(HostRangeData {
                host: host.address.clone(),
                series,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_step_keeps_small_ranges_at_finest_step() {
        let start = 0;
        let end = 60 * 60 * 1000;
        assert_eq!(pick_step(start, end, 1), 1000);
    }

    #[test]
    fn pick_step_widens_for_large_ranges() {
        let start = 0;
        let end = 30 * 24 * 60 * 60 * 1000;
        let step = pick_step(start, end, 1);
        assert!(step >= 3600 * 1000);
        assert!((end - start) / step <= MAX_POINTS_PER_SERIES);
    }

    #[test]
    fn pick_step_never_goes_narrower_than_the_probe_interval() {
        let start = 0;
        let end = 60 * 60 * 1000;
        // A small range would otherwise pick the 1s rung, but the probe
        // interval floor must win.
        let step = pick_step(start, end, 120);
        assert_eq!(step, 120 * 1000);
    }

    #[test]
    fn pick_step_floor_falls_back_when_no_rung_fits_both_constraints() {
        // No ladder rung is >= a 5-day probe interval; the floor itself
        // must still be returned rather than panicking or under-flooring.
        let start = 0;
        let end = 60 * 60 * 1000;
        let five_days_secs = 5 * 86_400;
        let step = pick_step(start, end, five_days_secs);
        assert_eq!(step, five_days_secs * 1000);
    }
}
