//! GPU presentation.
//!
//! Frames are rasterized on the CPU by a `raster::DrawSurface`; this module
//! uploads the resulting RGBA8 buffer and draws it over the whole window.

mod present;

pub use present::FramePresenter;
