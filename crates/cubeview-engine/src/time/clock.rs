use std::time::Duration;

use super::source::{MonotonicSource, TimeSource};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous sample, in seconds.
    pub dt: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Destructive-read clock.
///
/// Each `sample()` returns the time since the previous sample (or since
/// construction, for the first call) and moves the baseline to "now".
///
/// Deltas are never clamped: after a long stall the next sample reports the
/// whole gap. Callers must tolerate large single-step jumps.
#[derive(Debug, Clone)]
pub struct Clock<S: TimeSource = MonotonicSource> {
    source: S,
    last: Duration,
    frame_index: u64,
}

impl Clock<MonotonicSource> {
    pub fn new() -> Self {
        Self::with_source(MonotonicSource::new())
    }
}

impl Default for Clock<MonotonicSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TimeSource> Clock<S> {
    pub fn with_source(source: S) -> Self {
        let last = source.now();
        Self {
            source,
            last,
            frame_index: 0,
        }
    }

    /// Returns elapsed seconds since the previous sample.
    pub fn sample(&mut self) -> f32 {
        self.tick().dt
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = self.source.now();
        // A source that steps backwards yields zero, never a negative delta.
        let dt: Duration = now.saturating_sub(self.last);
        self.last = now.max(self.last);

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}
