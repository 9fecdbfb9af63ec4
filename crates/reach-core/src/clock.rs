use chrono::{DateTime, Utc};

/// Time source abstraction. The engine never calls `SystemTime::now()` or
/// `Instant::now()` directly outside of this trait's system impl, so the
/// scheduler and the alert state machine can be driven deterministically
/// in tests.
pub trait Clock: Send + Sync + 'static {
    /// Current wall-clock time, used for `fail_time` / `recovery_time` and
    /// for TSDB sample timestamps.
    fn now_utc(&self) -> DateTime<Utc>;

    fn now_rfc3339(&self) -> String {
        self.now_utc().to_rfc3339()
    }

    fn now_ms(&self) -> i64 {
        self.now_utc().timestamp_millis()
    }

    fn now_unix_secs(&self) -> u64 {
        self.now_utc().timestamp().max(0) as u64
    }
}

/// Production clock backed by the OS wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_util {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// A clock whose wall time is set explicitly, for deterministic tests
    /// of the alert state machine and TTL expiry.
    pub struct FixedClock {
        millis: AtomicI64,
    }

    impl FixedClock {
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                millis: AtomicI64::new(start.timestamp_millis()),
            }
        }

        pub fn advance(&self, duration: chrono::Duration) {
            self.millis
                .fetch_add(duration.num_milliseconds(), Ordering::SeqCst);
        }
    }

    impl Clock for FixedClock {
        fn now_utc(&self) -> DateTime<Utc> {
            DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst))
                .unwrap_or_else(Utc::now)
        }
    }
}
