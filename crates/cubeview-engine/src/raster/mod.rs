//! Draw surfaces.
//!
//! A draw surface turns a `SceneGraph` seen through a `PerspectiveCamera` into
//! an RGBA8 pixel buffer and can read that buffer back as an encoded image.
//! The window presents the buffer through `render::FramePresenter`.

mod error;
mod export;
mod software;

pub use error::DrawError;
pub use export::ExportFormat;
pub use software::SoftwareSurface;

use crate::scene::{PerspectiveCamera, SceneGraph};

/// Pixel dimensions of a draw surface.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Rendering target with pixel readback.
pub trait DrawSurface {
    fn size(&self) -> SurfaceSize;

    /// Reallocates the buffers; contents are undefined until the next draw.
    fn resize(&mut self, size: SurfaceSize);

    /// Renders `scene` from `camera`, replacing the previous contents.
    ///
    /// A zero-sized surface draws nothing and succeeds.
    fn draw(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), DrawError>;

    /// Tightly packed RGBA8 rows, top row first.
    fn pixels(&self) -> &[u8];

    /// Encodes the current contents.
    fn read_pixels(&self, format: ExportFormat) -> Result<Vec<u8>, DrawError> {
        export::encode(self.size(), self.pixels(), format)
    }
}
