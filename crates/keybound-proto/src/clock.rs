//! Time source for certificate issuance and cache expiry.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

/// Source of the current time.
pub trait Clock: fmt::Debug + Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can hand one clone to a
/// certificate authority and advance another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    epoch_secs: Arc<AtomicI64>,
}

impl ManualClock {
    /// Start at `epoch_secs` seconds since the Unix epoch.
    pub fn new(epoch_secs: i64) -> Self {
        Self {
            epoch_secs: Arc::new(AtomicI64::new(epoch_secs)),
        }
    }

    pub fn set(&self, epoch_secs: i64) {
        self.epoch_secs.store(epoch_secs, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let secs = i64::try_from(by.as_secs()).unwrap_or(i64::MAX);
        let _ = self
            .epoch_secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(secs))
            });
    }

    pub fn epoch_secs(&self) -> i64 {
        self.epoch_secs.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.epoch_secs())
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference epoch: 2025-01-01 00:00:00 UTC.
    const JAN_1_2025: i64 = 1735689600;

    #[test]
    fn manual_clock_reports_set_time() {
        let clock = ManualClock::new(JAN_1_2025);
        assert_eq!(clock.now().unix_timestamp(), JAN_1_2025);
    }

    #[test]
    fn clones_share_time() {
        let clock = ManualClock::new(JAN_1_2025);
        let other = clock.clone();
        other.advance(Duration::from_secs(3600));
        assert_eq!(clock.now().unix_timestamp(), JAN_1_2025 + 3600);

        clock.set(JAN_1_2025);
        assert_eq!(other.epoch_secs(), JAN_1_2025);
    }

    #[test]
    fn advance_saturates_instead_of_wrapping() {
        let clock = ManualClock::new(i64::MAX - 10);
        clock.advance(Duration::from_secs(3600));
        assert_eq!(clock.epoch_secs(), i64::MAX);

        clock.advance(Duration::MAX);
        assert_eq!(clock.epoch_secs(), i64::MAX);
    }

    #[test]
    fn system_clock_is_after_2025() {
        assert!(SystemClock.now().unix_timestamp() > JAN_1_2025);
    }
}
