/// Append-only labeled numeric sample store, backed by SQLite.
///
/// One appender per call scope: every metric belonging to one Checker
/// tick for one host is written inside a single transaction, so a
/// partial write can never be observed — a failed append rolls back
/// the whole tick's samples for that host. Retention is enforced by an
/// `AFTER INSERT` trigger so old rows are pruned incrementally rather
/// than requiring a separate sweep task.
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use reach_core::metric::MetricName;
use rusqlite::{params, Connection};

pub struct Tsdb {
    conn: Mutex<Connection>,
}

/// One point of a range-query series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub timestamp_ms: i64,
    pub value: f64,
}

impl Tsdb {
    pub fn open(path: impl AsRef<Path>, retention_ms: i64) -> anyhow::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn, retention_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory(retention_ms: i64) -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn, retention_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection, retention_ms: i64) -> anyhow::Result<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS samples (
                name TEXT NOT NULL,
                host TEXT NOT NULL,
                ts_ms INTEGER NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (name, host, ts_ms)
            );
            CREATE INDEX IF NOT EXISTS samples_by_host_name_ts
                ON samples (name, host, ts_ms);

            CREATE TRIGGER IF NOT EXISTS samples_retention
            AFTER INSERT ON samples
            BEGIN
                DELETE FROM samples WHERE ts_ms < NEW.ts_ms - {retention_ms};
            END;"
        ))?;
        Ok(())
    }

    /// Append the four per-tick metrics for one host in a single
    /// transaction. Any single insert failing rolls back the whole set.
    pub fn append_tick(
        &self,
        host: &str,
        timestamp_ms: i64,
        min_ms: f64,
        avg_ms: f64,
        max_ms: f64,
        packet_loss: f64,
    ) -> anyhow::Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let txn = conn.transaction()?;
        let rows: [(MetricName, f64); 4] = [
            (MetricName::MinLatency, min_ms),
            (MetricName::AvgLatency, avg_ms),
            (MetricName::MaxLatency, max_ms),
            (MetricName::PacketLoss, packet_loss),
        ];
        for (name, value) in rows {
            txn.execute(
                "INSERT OR REPLACE INTO samples (name, host, ts_ms, value) VALUES (?1, ?2, ?3, ?4)",
                params![name.as_str(), host, timestamp_ms, value],
            )?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Instant query: the most recent sample at or before `now_ms` for
    /// each requested host.
    pub fn query_latest(
        &self,
        hosts: &[String],
        metric: MetricName,
        now_ms: i64,
    ) -> anyhow::Result<HashMap<String, f64>> {
        if hosts.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.conn.lock().unwrap();
        let mut result = HashMap::new();
        let mut stmt = conn.prepare(
            "SELECT value FROM samples
             WHERE name = ?1 AND host = ?2 AND ts_ms <= ?3
             ORDER BY ts_ms DESC LIMIT 1",
        )?;
        for host in hosts {
            let value: Option<f64> = stmt
                .query_row(params![metric.as_str(), host, now_ms], |row| row.get(0))
                .ok();
            if let Some(v) = value {
                result.insert(host.clone(), v);
            }
        }
        Ok(result)
    }

    /// Range query with step-bucketed averaging: samples are grouped
    /// into `step_ms`-wide buckets and averaged, matching the point
    /// budget the caller picked in [`crate::query::pick_step`].
    pub fn query_range(
        &self,
        hosts: &[String],
        metric: MetricName,
        start_ms: i64,
        end_ms: i64,
        step_ms: i64,
    ) -> anyhow::Result<HashMap<String, Vec<TimeSeriesPoint>>> {
        let conn = self.conn.lock().unwrap();
        let mut result = HashMap::new();
        let step_ms = step_ms.max(1);
        let mut stmt = conn.prepare(
            "SELECT (ts_ms / ?1) * ?1 AS bucket, AVG(value)
             FROM samples
             WHERE name = ?2 AND host = ?3 AND ts_ms >= ?4 AND ts_ms <= ?5
             GROUP BY bucket
             ORDER BY bucket",
        )?;
        for host in hosts {
            let points = stmt
                .query_map(
                    params![step_ms, metric.as_str(), host, start_ms, end_ms],
                    |row| {
                        Ok(TimeSeriesPoint {
                            timestamp_ms: row.get(0)?,
                            value: row.get(1)?,
                        })
                    },
                )?
                .collect::<Result<Vec<_>, _>>()?;
            if !points.is_empty() {
                result.insert(host.clone(), points);
            }
        }
        Ok(result)
    }
}

/// Parses `"<int><d|h|m>"` into milliseconds, e.g. `"7d"` -> 604_800_000.
pub fn parse_retention(retention: &str) -> anyhow::Result<i64> {
    let retention = retention.trim();
    if retention.is_empty() {
        anyhow::bail!("retention string is empty");
    }
    let (value, unit) = retention.split_at(retention.len() - 1);
    let value: i64 = value
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid retention format: {retention}"))?;
    let ms = match unit {
        "d" => value * 24 * 60 * 60 * 1000,
        "h" => value * 60 * 60 * 1000,
        "m" => value * 60 * 1000,
        other => anyhow::bail!("unsupported retention unit: {other}"),
    };
    Ok(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_retention_units() {
        assert_eq!(parse_retention("7d").unwrap(), 7 * 86_400_000);
        assert_eq!(parse_retention("2h").unwrap(), 2 * 3_600_000);
        assert_eq!(parse_retention("30m").unwrap(), 30 * 60_000);
    }

    #[test]
    fn append_then_query_latest() {
        let db = Tsdb::open_in_memory(7 * 86_400_000).unwrap();
        db.append_tick("h1", 1_000, 10.0, 12.0, 15.0, 0.0).unwrap();
        db.append_tick("h1", 2_000, 11.0, 13.0, 16.0, 0.0).unwrap();
        let latest = db
            .query_latest(&["h1".to_string()], MetricName::AvgLatency, 5_000)
            .unwrap();
        assert_eq!(latest.get("h1"), Some(&13.0));
    }

    #[test]
    fn append_is_atomic_across_metrics() {
        let db = Tsdb::open_in_memory(7 * 86_400_000).unwrap();
        db.append_tick("h1", 1_000, 1.0, 2.0, 3.0, 4.0).unwrap();
        let got = db
            .query_latest(
                &["h1".to_string()],
                MetricName::PacketLoss,
                10_000,
            )
            .unwrap();
        assert_eq!(got.get("h1"), Some(&4.0));
    }

    #[test]
    fn range_query_buckets_by_step() {
        let db = Tsdb::open_in_memory(7 * 86_400_000).unwrap();
        for ts in [0, 1_000, 2_000, 3_000] {
            db.append_tick("h1", ts, ts as f64, ts as f64, ts as f64, 0.0)
                .unwrap();
        }
        let series = db
            .query_range(&["h1".to_string()], MetricName::MinLatency, 0, 3_000, 2_000)
            .unwrap();
        let points = series.get("h1").unwrap();
        assert_eq!(points.len(), 2);
    }
}
