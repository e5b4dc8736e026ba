use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source shared by the scheduler and the sequence engine.
///
/// Every timestamp in a session is a `Duration` measured from the same origin,
/// so differences between them never suffer from wall-clock adjustments.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Production clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulated clock whose clones all observe the same time.
///
/// Time only moves when `set` or `advance` is called, which makes timer
/// behaviour reproducible in tests and headless drivers.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time(time: Duration) -> Self {
        Self {
            now: Rc::new(Cell::new(time)),
        }
    }

    /// Moves the clock to `time`. Attempts to move backwards are ignored.
    pub fn set(&self, time: Duration) {
        if time > self.now.get() {
            self.now.set(time);
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set_ms(&self, ms: u64) {
        self.set(Duration::from_millis(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Signed difference `later - earlier` in seconds.
pub fn secs_between(earlier: Duration, later: Duration) -> f64 {
    later.as_secs_f64() - earlier.as_secs_f64()
}
