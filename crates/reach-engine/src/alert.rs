/// Durable per-host alert state machine, built on top of [`crate::store::KvStore`].
///
/// A host's row lives under `alert_status:<host>` and carries the TTL
/// configured as `db.expire`. `mark_alert`/`mark_recovered` are called from
/// the Checker's tick loop; `update_sent` is called only from the Dispatcher,
/// once a notification has actually gone out. Keeping those two writers
/// apart is what lets the aggregation window batch rows without racing the
/// Checker's own writes.
use reach_core::alert::{AlertStatus, StatusType};
use reach_core::Clock;
use tracing::warn;

use crate::store::KvStore;

pub struct AlertStateManager<'a> {
    kv: &'a KvStore,
    clock: &'a dyn Clock,
    ttl_secs: i64,
}

impl<'a> AlertStateManager<'a> {
    pub fn new(kv: &'a KvStore, clock: &'a dyn Clock, ttl_secs: i64) -> Self {
        Self { kv, clock, ttl_secs }
    }

    pub fn get(&self, host: &str) -> anyhow::Result<Option<AlertStatus>> {
        let key = AlertStatus::key(host);
        match self.kv.get(&key, self.clock)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, status: &AlertStatus) -> anyhow::Result<()> {
        let key = AlertStatus::key(&status.host);
        let bytes = serde_json::to_vec(status)?;
        self.kv.set(&key, &bytes, self.ttl_secs, self.clock)
    }

    pub fn delete(&self, host: &str) -> anyhow::Result<()> {
        self.kv.delete(&AlertStatus::key(host))
    }

    /// Record a failing probe for `host`. A host already in ALERT state has
    /// its row re-written as-is rather than reset — this refreshes the TTL
    /// without touching `fail_time` or `sent`, so a long outage can't let
    /// the row roll off and resurrect itself as an unsent duplicate.
    pub fn mark_alert(
        &self,
        host: &str,
        description: &str,
        fail_alert: bool,
    ) -> anyhow::Result<AlertStatus> {
        self.mark_alert_inner(host, description, fail_alert, None)
    }

    /// Re-raises an ALERT for a host whose incident start time is already
    /// known from outside the store (e.g. a row deleted out-of-band, or a
    /// store restored from an older backup, while the host was still down).
    /// Implements the anti-storm tie-break: inserting a brand-new row with a
    /// non-empty carried `fail_time` marks it `sent=true` immediately, so
    /// restoring a still-open incident does not re-fire a notification that
    /// already went out for it.
    pub fn restore_alert(
        &self,
        host: &str,
        description: &str,
        fail_alert: bool,
        fail_time: &str,
    ) -> anyhow::Result<AlertStatus> {
        self.mark_alert_inner(host, description, fail_alert, Some(fail_time))
    }

    fn mark_alert_inner(
        &self,
        host: &str,
        description: &str,
        fail_alert: bool,
        carried_fail_time: Option<&str>,
    ) -> anyhow::Result<AlertStatus> {
        if let Some(existing) = self.get(host)? {
            if existing.status == StatusType::Alert {
                self.put(&existing)?;
                return Ok(existing);
            }
        }
        let fail_time = match carried_fail_time {
            Some(t) => t.to_string(),
            None => self.clock.now_rfc3339(),
        };
        let sent = carried_fail_time.is_some_and(|t| !t.is_empty());
        let status = AlertStatus {
            host: host.to_string(),
            description: description.to_string(),
            fail_alert,
            status: StatusType::Alert,
            fail_time,
            recovery_time: String::new(),
            sent,
        };
        self.put(&status)?;
        Ok(status)
    }

    /// Record a successful probe for `host`. No-op if the host has no prior
    /// ALERT row (nothing to recover from) or is already in RECOVERY.
    pub fn mark_recovered(&self, host: &str) -> anyhow::Result<Option<AlertStatus>> {
        let Some(mut existing) = self.get(host)? else {
            return Ok(None);
        };
        if existing.status == StatusType::Recovery {
            return Ok(Some(existing));
        }
        existing.status = StatusType::Recovery;
        existing.sent = false;
        existing.recovery_time = self.clock.now_rfc3339();
        self.put(&existing)?;
        Ok(Some(existing))
    }

    /// All rows of `status_type` that the Dispatcher has not yet notified on.
    /// A row that fails to decode is logged and skipped rather than aborting
    /// the scan — one corrupt or foreign row under the prefix must not stall
    /// delivery for every other host.
    pub fn list_unsent(&self, status_type: StatusType) -> anyhow::Result<Vec<AlertStatus>> {
        let rows = self.kv.list_prefix(AlertStatus::key_prefix(), self.clock)?;
        let mut out = Vec::new();
        for (key, bytes) in rows {
            let status: AlertStatus = match serde_json::from_slice(&bytes) {
                Ok(status) => status,
                Err(e) => {
                    warn!("skipping undecodable alert status row {key}: {e}");
                    continue;
                }
            };
            if !status.sent && status.status == status_type {
                out.push(status);
            }
        }
        Ok(out)
    }

    /// Only the Dispatcher calls this, after a notification has been handed
    /// to every configured sink.
    pub fn update_sent(&self, host: &str, sent: bool) -> anyhow::Result<()> {
        let mut existing = self
            .get(host)?
            .ok_or_else(|| anyhow::anyhow!("alert status for host {host} not found"))?;
        existing.sent = sent;
        self.put(&existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reach_core::clock::test_util::FixedClock;
    use chrono::Utc;

    fn manager<'a>(kv: &'a KvStore, clock: &'a FixedClock) -> AlertStateManager<'a> {
        AlertStateManager::new(kv, clock, 86_400)
    }

    #[test]
    fn first_failure_creates_unsent_alert_row() {
        let kv = KvStore::open_in_memory().unwrap();
        let clock = FixedClock::new(Utc::now());
        let mgr = manager(&kv, &clock);
        let status = mgr.mark_alert("h1", "host one", true).unwrap();
        assert_eq!(status.status, StatusType::Alert);
        assert!(!status.sent);
        assert!(!status.fail_time.is_empty());
    }

    #[test]
    fn repeated_failure_does_not_reset_fail_time_or_sent() {
        let kv = KvStore::open_in_memory().unwrap();
        let clock = FixedClock::new(Utc::now());
        let mgr = manager(&kv, &clock);
        let first = mgr.mark_alert("h1", "host one", true).unwrap();
        mgr.update_sent("h1", true).unwrap();
        clock.advance(chrono::Duration::seconds(60));
        let second = mgr.mark_alert("h1", "host one", true).unwrap();
        assert_eq!(second.fail_time, first.fail_time);
        assert!(second.sent, "already-sent alert must stay sent on repeat failure");
    }

    #[test]
    fn restore_alert_with_carried_fail_time_is_anti_storm_sent() {
        let kv = KvStore::open_in_memory().unwrap();
        let clock = FixedClock::new(Utc::now());
        let mgr = manager(&kv, &clock);
        let restored = mgr
            .restore_alert("h1", "host one", true, "2026-01-01T00:00:00Z")
            .unwrap();
        assert_eq!(restored.fail_time, "2026-01-01T00:00:00Z");
        assert!(restored.sent, "restoring a known-open incident must not re-fire a send");
        assert!(
            mgr.list_unsent(StatusType::Alert).unwrap().is_empty(),
            "an anti-storm restored row must not show up as dispatcher work"
        );
    }

    #[test]
    fn list_unsent_skips_undecodable_rows_without_aborting() {
        let kv = KvStore::open_in_memory().unwrap();
        let clock = FixedClock::new(Utc::now());
        let mgr = manager(&kv, &clock);
        mgr.mark_alert("h1", "d1", true).unwrap();
        kv.set("alert_status:corrupt", b"not json", 86_400, &clock)
            .unwrap();
        let unsent = mgr.list_unsent(StatusType::Alert).unwrap();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].host, "h1");
    }

    #[test]
    fn recovery_without_prior_alert_is_noop() {
        let kv = KvStore::open_in_memory().unwrap();
        let clock = FixedClock::new(Utc::now());
        let mgr = manager(&kv, &clock);
        assert!(mgr.mark_recovered("ghost").unwrap().is_none());
    }

    #[test]
    fn recovery_after_alert_resets_sent_flag() {
        let kv = KvStore::open_in_memory().unwrap();
        let clock = FixedClock::new(Utc::now());
        let mgr = manager(&kv, &clock);
        mgr.mark_alert("h1", "host one", true).unwrap();
        mgr.update_sent("h1", true).unwrap();
        let recovered = mgr.mark_recovered("h1").unwrap().unwrap();
        assert_eq!(recovered.status, StatusType::Recovery);
        assert!(!recovered.sent);
    }

    #[test]
    fn list_unsent_filters_by_status_and_sent() {
        let kv = KvStore::open_in_memory().unwrap();
        let clock = FixedClock::new(Utc::now());
        let mgr = manager(&kv, &clock);
        mgr.mark_alert("h1", "d1", true).unwrap();
        mgr.mark_alert("h2", "d2", true).unwrap();
        mgr.update_sent("h2", true).unwrap();
        let unsent = mgr.list_unsent(StatusType::Alert).unwrap();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].host, "h1");
    }
}
