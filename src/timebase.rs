use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of monotonic "now" for the controller.
///
/// Timestamps are offsets from an arbitrary epoch; only differences matter.
pub trait Timebase {
    fn now(&self) -> Duration;
}

/// Wall-clock timebase measured from construction.
pub struct MonotonicTimebase {
    start: Instant,
}

impl MonotonicTimebase {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for MonotonicTimebase {
    fn default() -> Self {
        Self::new()
    }
}

impl Timebase for MonotonicTimebase {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Hand-driven timebase. Clones share the same instant, so a test can keep one
/// handle while the controller owns another.
#[derive(Clone, Default)]
pub struct ManualTimebase {
    now: Rc<Cell<Duration>>,
}

impl ManualTimebase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, t: Duration) {
        self.now.set(t);
    }

    pub fn set_secs(&self, secs: f64) {
        self.now.set(Duration::from_secs_f64(secs));
    }

    pub fn advance(&self, dt: Duration) {
        self.now.set(self.now.get() + dt);
    }
}

impl Timebase for ManualTimebase {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
