use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};

/// Source of "now" for every expiry decision a cache makes.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Clock that only moves when told to. Clones share the same instant, so a
/// test can keep one handle while the cache owns another.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Starts the clock at `secs` seconds after the Unix epoch.
    ///
    /// # Panics
    ///
    /// Panics if `secs` is outside the range `jiff::Timestamp` supports.
    pub fn at_second(secs: i64) -> Self {
        let start = Timestamp::from_second(secs)
            .unwrap_or_else(|e| panic!("timestamp {secs} out of range: {e}"));
        Self::new(start)
    }

    pub fn set(&self, at: Timestamp) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }

    /// # Panics
    ///
    /// Panics if the clock would leave the supported timestamp range.
    pub fn advance(&self, by: Duration) {
        let by = SignedDuration::try_from(by)
            .unwrap_or_else(|e| panic!("clock advance overflowed: {e}"));
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = guard
            .checked_add(by)
            .unwrap_or_else(|e| panic!("clock advance overflowed: {e}"));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
