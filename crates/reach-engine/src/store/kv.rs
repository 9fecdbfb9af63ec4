/// Embedded ordered key/value store with per-key TTL, backed by SQLite.
///
/// Mirrors the role the reference engine gives an embedded KV database:
/// a single `(key, value, expires_at)` table, one writer at a time, reads
/// that treat an expired row as absent rather than surfacing an error.
use std::path::Path;
use std::sync::Mutex;

use reach_core::Clock;
use rusqlite::{params, Connection, OptionalExtension};

pub struct KvStore {
    conn: Mutex<Connection>,
}

impl KvStore {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                expires_at INTEGER NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                expires_at INTEGER NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn set(&self, key: &str, value: &[u8], ttl_secs: i64, clock: &dyn Clock) -> anyhow::Result<()> {
        let expires_at = clock.now_unix_secs() as i64 + ttl_secs;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![key, value, expires_at],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str, clock: &dyn Clock) -> anyhow::Result<Option<Vec<u8>>> {
        let conn = self.conn.lock().unwrap();
        let now = clock.now_unix_secs() as i64;
        let value: Option<Vec<u8>> = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1 AND expires_at > ?2",
                params![key, now],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn delete(&self, key: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Bounded prefix seek: every live key starting with `prefix`, in key
    /// order. Rows that fail `decode` are skipped (logged by the caller)
    /// rather than aborting the scan — a corrupt or foreign row must not
    /// block visibility into the rest of the table.
    pub fn list_prefix(&self, prefix: &str, clock: &dyn Clock) -> anyhow::Result<Vec<(String, Vec<u8>)>> {
        let conn = self.conn.lock().unwrap();
        let now = clock.now_unix_secs() as i64;
        // SQLite's default BLOB collation sorts "prefix" <= key < "prefix\xff...",
        // which is the idiomatic bounded-prefix seek for a TEXT primary key.
        let upper = format!("{prefix}\u{10ffff}");
        let mut stmt = conn.prepare(
            "SELECT key, value FROM kv WHERE key >= ?1 AND key < ?2 AND expires_at > ?3 ORDER BY key",
        )?;
        let rows = stmt
            .query_map(params![prefix, upper, now], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Remove every row whose TTL has already elapsed. Not required for
    /// correctness (reads already filter expired rows) but keeps the
    /// table from growing unbounded across long uptimes.
    pub fn purge_expired(&self, clock: &dyn Clock) -> anyhow::Result<usize> {
        let conn = self.conn.lock().unwrap();
        let now = clock.now_unix_secs() as i64;
        let n = conn.execute("DELETE FROM kv WHERE expires_at <= ?1", params![now])?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reach_core::clock::test_util::FixedClock;
    use reach_core::clock::SystemClock;
    use chrono::Utc;

    #[test]
    fn set_then_get_round_trips() {
        let store = KvStore::open_in_memory().unwrap();
        let clock = SystemClock;
        store.set("a", b"hello", 60, &clock).unwrap();
        assert_eq!(store.get("a", &clock).unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn expired_key_reads_as_absent() {
        let store = KvStore::open_in_memory().unwrap();
        let clock = FixedClock::new(Utc::now());
        store.set("a", b"hello", 5, &clock).unwrap();
        clock.advance(chrono::Duration::seconds(10));
        assert_eq!(store.get("a", &clock).unwrap(), None);
    }

    #[test]
    fn list_prefix_is_bounded_and_ordered() {
        let store = KvStore::open_in_memory().unwrap();
        let clock = SystemClock;
        store.set("alert_status:b", b"1", 60, &clock).unwrap();
        store.set("alert_status:a", b"2", 60, &clock).unwrap();
        store.set("hosts", b"3", 60, &clock).unwrap();
        let rows = store.list_prefix("alert_status:", &clock).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "alert_status:a");
        assert_eq!(rows[1].0, "alert_status:b");
    }

    #[test]
    fn purge_expired_removes_only_dead_rows() {
        let store = KvStore::open_in_memory().unwrap();
        let clock = FixedClock::new(Utc::now());
        store.set("dead", b"1", 1, &clock).unwrap();
        store.set("alive", b"2", 100, &clock).unwrap();
        clock.advance(chrono::Duration::seconds(5));
        let removed = store.purge_expired(&clock).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.get("alive", &clock).unwrap(), Some(b"2".to_vec()));
    }
}
