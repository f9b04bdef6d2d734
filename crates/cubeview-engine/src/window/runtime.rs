use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, AttachCtx, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::winit::translate_window_event;
use crate::input::{InputHub, PointerFrame, PointerState};
use crate::render::FramePresenter;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "cubeview".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Requests the app can make from `on_frame`.
///
/// Applied after the frame callback returns.
#[derive(Debug, Default)]
pub struct RuntimeCtx {
    exit: bool,
}

impl RuntimeCtx {
    /// Closes the window and leaves the event loop.
    pub fn exit(&mut self) {
        self.exit = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and redraws it continuously until it is closed or the
    /// app asks to exit.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState {
            config,
            gpu_init,
            app,
            entry: None,
            exit_requested: false,
            minimized: false,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

/// The window together with everything bound to its lifetime.
#[self_referencing]
struct WindowEntry {
    input: InputHub,
    pointer: PointerState,
    pointer_frame: PointerFrame,
    presenter: FramePresenter,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

impl WindowEntry {
    fn id(&self) -> WindowId {
        self.with_window(|w| w.id())
    }

    fn request_redraw(&self) {
        self.with_window(|w| w.request_redraw());
    }
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    exit_requested: bool,
    /// Redraws pause while the surface has no area.
    minimized: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryBuilder {
            input: InputHub::new(),
            pointer: PointerState::default(),
            pointer_frame: PointerFrame::default(),
            presenter: FramePresenter::new(),
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, gpu_init))
                    .expect("GPU initialization failed for window")
            },
        }
        .build();

        let app = &mut self.app;
        let entry = self.entry.insert(entry);
        entry.with(|fields| {
            let mut ctx = AttachCtx {
                window: WindowCtx {
                    id: fields.window.id(),
                    window: fields.window,
                },
                input: fields.input,
            };
            app.on_attach(&mut ctx);
        });

        log::info!("window {:?} attached", entry.id());
        entry.request_redraw();
        Ok(())
    }

    /// Detaches the app and drops the window; the input hub goes with it.
    fn close_window(&mut self) {
        if let Some(entry) = self.entry.take() {
            let id = entry.id();
            self.app.on_detach(id);
            drop(entry);
            log::info!("window {id:?} detached");
        }
        self.exit_requested = true;
    }

    fn redraw(&mut self) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let app = &mut self.app;
        let mut runtime_ctx = RuntimeCtx::default();
        let mut control = AppControl::Continue;

        entry.with_mut(|fields| {
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id: fields.window.id(),
                    window: fields.window,
                },
                gpu: fields.gpu,
                presenter: fields.presenter,
                input: fields.input,
                pointer: fields.pointer,
                pointer_frame: fields.pointer_frame,
                runtime: &mut runtime_ctx,
            };
            control = app.on_frame(&mut ctx);

            // Deltas belong to the frame that just consumed them.
            fields.pointer_frame.clear();
        });

        if control == AppControl::Exit || runtime_ctx.exit_requested() {
            self.close_window();
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }
        if let Err(e) = self.open_window(event_loop) {
            log::error!("failed to create window: {e:#}");
            self.exit_requested = true;
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // One tick per presented frame; FIFO presentation does the pacing.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = self.entry.as_ref().filter(|_| !self.minimized) {
            entry.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let app = &mut self.app;
        let Some(entry) = self.entry.as_mut().filter(|e| e.id() == window_id) else {
            return;
        };

        let mut exit_from_app_event = false;
        entry.with_mut(|fields| {
            if let Some(ev) = translate_window_event(fields.window, fields.pointer, &event) {
                fields.pointer.apply_event(fields.pointer_frame, &ev);
                // Listeners see the event before the next frame starts.
                fields.input.dispatch(&ev);
            }

            if app.on_window_event(window_id, &event) == AppControl::Exit {
                exit_from_app_event = true;
            }
        });

        match &event {
            _ if exit_from_app_event => self.close_window(),

            WindowEvent::CloseRequested | WindowEvent::Destroyed => self.close_window(),

            WindowEvent::Resized(new_size) => {
                self.minimized = new_size.width == 0 || new_size.height == 0;
                entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                entry.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                entry.request_redraw();
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.close_window();
    }
}
