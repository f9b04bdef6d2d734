//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - one `Clock` per view (owned by the render loop, never shared)
//! - call `sample()` once per tick to obtain the seconds elapsed since the previous sample

mod clock;
mod source;

pub use clock::{Clock, FrameTime};
pub use source::{ManualSource, MonotonicSource, TimeSource};
