use std::path::PathBuf;

use anyhow::Result;
use winit::dpi::LogicalSize;
use winit::window::WindowId;

use cubeview_engine::assets::ThreadedLoader;
use cubeview_engine::core::{App as EngineApp, AppControl, AttachCtx, FrameCtx};
use cubeview_engine::device::GpuInit;
use cubeview_engine::raster::{ExportFormat, SoftwareSurface};
use cubeview_engine::time::Clock;
use cubeview_engine::window::{Runtime, RuntimeConfig};

use crate::bindings::{Action, ActionBindings};
use crate::config::ViewerConfig;
use crate::export::{DirectorySink, ExportSink};
use crate::picker::{NoPicker, ResourcePicker};
use crate::viewport::ViewportController;

// ── Viewer ────────────────────────────────────────────────────────────────

/// Top-level viewer builder.
///
/// Configure, then start the event loop with [`Viewer::run`]:
///
/// ```rust,ignore
/// Viewer::new()
///     .title("cubeview")
///     .asset_root("./site")
///     .export_format(ExportFormat::Jpeg)
///     .run()?;
/// ```
pub struct Viewer {
    config: ViewerConfig,
    picker: Box<dyn ResourcePicker>,
    sink:   Option<Box<dyn ExportSink>>,
}

impl Viewer {
    pub fn new() -> Self {
        Self::with_config(ViewerConfig::default())
    }

    pub fn with_config(config: ViewerConfig) -> Self {
        Self {
            config,
            picker: Box::new(NoPicker),
            sink:   None,
        }
    }

    /// Set the window title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Set the initial window size in logical pixels.
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.config.window_size = (width, height);
        self
    }

    /// Directory asset URLs resolve against.
    pub fn asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.asset_root = root.into();
        self
    }

    /// Directory exports are written to, unless a custom sink is set.
    pub fn export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.export_dir = dir.into();
        self
    }

    pub fn export_format(mut self, format: ExportFormat) -> Self {
        self.config.export_format = format;
        self
    }

    /// Source of background selections for the load-background action.
    pub fn picker(mut self, picker: impl ResourcePicker + 'static) -> Self {
        self.picker = Box::new(picker);
        self
    }

    /// Replaces the default directory sink.
    pub fn sink(mut self, sink: impl ExportSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Opens the window and runs until it is closed.
    pub fn run(self) -> Result<()> {
        let (width, height) = self.config.window_size;
        let runtime_config = RuntimeConfig {
            title:        self.config.title.clone(),
            initial_size: LogicalSize::new(width, height),
        };
        Runtime::run(runtime_config, GpuInit::default(), ViewerApp::new(self))
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

// ── ViewerApp ─────────────────────────────────────────────────────────────

struct ViewerApp {
    config:  ViewerConfig,
    picker:  Box<dyn ResourcePicker>,
    sink:    Box<dyn ExportSink>,
    actions: ActionBindings,

    view: Option<(WindowId, ViewportController)>,
}

impl ViewerApp {
    fn new(viewer: Viewer) -> Self {
        let sink = viewer
            .sink
            .unwrap_or_else(|| Box::new(DirectorySink::new(viewer.config.export_dir.clone())));
        Self {
            config:  viewer.config,
            picker:  viewer.picker,
            sink,
            actions: ActionBindings::default(),
            view:    None,
        }
    }

    fn title(&self, format: ExportFormat) -> String {
        format!("{} [{}]", self.config.title, format)
    }
}

impl EngineApp for ViewerApp {
    fn on_attach(&mut self, ctx: &mut AttachCtx<'_>) {
        if self.view.is_some() {
            log::warn!("viewer already attached; ignoring window {:?}", ctx.window.id);
            return;
        }

        let size = ctx.window.surface_size();
        let surface = SoftwareSurface::new(size.width, size.height);
        let loader = ThreadedLoader::new(self.config.asset_root.clone());

        let mut controller = ViewportController::new(
            self.config.clone(),
            ctx.input,
            Box::new(surface),
            Box::new(loader),
            Clock::new(),
        );
        controller.start();
        ctx.window.set_title(&self.title(controller.export_format()));

        log::info!(
            "viewer attached at {}x{}, assets from {}",
            size.width,
            size.height,
            self.config.asset_root.display()
        );
        self.view = Some((ctx.window.id, controller));
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some((_, controller)) = self.view.as_mut() else {
            return AppControl::Continue;
        };

        let actions = match controller.keyboard() {
            Some(keyboard) => self.actions.poll(keyboard),
            None => Vec::new(),
        };
        for action in actions {
            match action {
                Action::LoadBackground => {
                    controller.load_background(self.picker.as_mut());
                }
                Action::ExportFrame => {
                    if let Err(err) = controller.export_frame(self.sink.as_mut()) {
                        log::error!("export failed: {err:#}");
                    }
                }
                Action::ToggleExportFormat => {
                    let format = controller.toggle_export_format();
                    ctx.window
                        .set_title(&format!("{} [{}]", self.config.title, format));
                }
            }
        }

        controller.frame(ctx.window.surface_size(), ctx.pointer, ctx.pointer_frame);

        let surface = controller.surface();
        ctx.present(surface.size(), surface.pixels())
    }

    fn on_detach(&mut self, window_id: WindowId) {
        match self.view.take() {
            Some((id, mut controller)) if id == window_id => {
                controller.stop();
                log::info!("viewer detached");
            }
            other => self.view = other,
        }
    }
}
