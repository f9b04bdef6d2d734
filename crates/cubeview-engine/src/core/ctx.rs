use winit::window::{Window, WindowId};

use crate::device::{Gpu, SurfaceErrorAction};
use crate::input::{InputHub, PointerFrame, PointerState};
use crate::raster::SurfaceSize;
use crate::render::FramePresenter;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Drawable size in physical pixels.
    pub fn surface_size(&self) -> SurfaceSize {
        let size = self.window.inner_size();
        SurfaceSize::new(size.width, size.height)
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// Context passed to `core::App::on_attach`.
pub struct AttachCtx<'a> {
    pub window: WindowCtx<'a>,
    /// Source of this window's input events; subscribe to observe them.
    pub input: &'a InputHub,
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub presenter: &'a mut FramePresenter,
    pub input: &'a InputHub,
    pub pointer: &'a PointerState,
    pub pointer_frame: &'a PointerFrame,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Uploads a CPU-rendered RGBA8 frame and presents it to the window.
    ///
    /// Surface loss is handled here; only a fatal surface error asks the
    /// runtime to exit.
    pub fn present(&mut self, size: SurfaceSize, pixels: &[u8]) -> AppControl {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err);
                if action == SurfaceErrorAction::Fatal {
                    return AppControl::Exit;
                }
                return AppControl::Continue;
            }
        };

        self.presenter.present(self.gpu, &mut frame, size, pixels);

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        AppControl::Continue
    }
}
