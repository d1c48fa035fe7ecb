use std::thread;
use std::time::{Duration, Instant};

/// Source of monotonic time for poll periods, hold timers and deadlines.
///
/// Everything time-dependent in the bench reads the clock through this trait,
/// so tests can run a multi-second hold without waiting for it.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Wait for `d`. A simulated clock may just move its own time forward.
    fn sleep(&self, d: Duration);

    /// Whole milliseconds from `epoch` to now; 0 if `epoch` is later than now.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        u64::try_from(dur.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Wall-independent system clock (`Instant::now`, `thread::sleep`).
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            thread::sleep(d);
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_clock {
    use super::{Clock, Duration, Instant};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Simulated clock that only moves when told to, in whole milliseconds.
    ///
    /// `sleep` returns immediately after moving time forward, which lets a
    /// poller thread run its loop at full speed. Clones read the same time.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        start: Instant,
        elapsed_ms: Arc<AtomicU64>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
                elapsed_ms: Arc::new(AtomicU64::new(0)),
            }
        }

        /// Move time forward by `d`, truncated to milliseconds.
        pub fn advance(&self, d: Duration) {
            let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
            let _ = self
                .elapsed_ms
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                    Some(t.saturating_add(ms))
                });
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.start + Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }
}
