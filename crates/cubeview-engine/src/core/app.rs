use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::{AttachCtx, FrameCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Per window the runtime calls `on_attach` once, then `on_window_event` and
/// `on_frame` interleaved, then `on_detach` exactly once when the window goes
/// away (closed, or the event loop exits).
pub trait App {
    /// Called when a window and its GPU surface are ready.
    fn on_attach(&mut self, ctx: &mut AttachCtx<'_>) {
        let _ = ctx;
    }

    /// Called for raw window events, after input listeners have seen them.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per rendered frame per window.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called when a window is torn down.
    fn on_detach(&mut self, window_id: WindowId) {
        let _ = window_id;
    }
}
