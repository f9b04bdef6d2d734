use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of monotonic timestamps.
///
/// Timestamps are offsets from an arbitrary, source-specific origin. Only the
/// difference between two readings of the same source is meaningful.
pub trait TimeSource {
    fn now(&self) -> Duration;
}

/// Wall-clock source backed by `Instant`.
#[derive(Debug, Clone)]
pub struct MonotonicSource {
    origin: Instant,
}

impl MonotonicSource {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced source.
///
/// Clones share the same timeline, so a test can keep one handle and give
/// another to a `Clock`.
#[derive(Debug, Clone, Default)]
pub struct ManualSource {
    now: Rc<Cell<Duration>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: f32) {
        self.advance(Duration::from_secs_f32(secs));
    }

    /// Moves the timeline to an absolute offset, including backwards.
    pub fn set(&self, at: Duration) {
        self.now.set(at);
    }
}

impl TimeSource for ManualSource {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
