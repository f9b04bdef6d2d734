use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use cubeview_engine::logging::{init_logging, LoggingConfig};
use cubeview_engine::raster::ExportFormat;
use cubeview_viewer::{ResourcePicker, Viewer, ViewerConfig};

#[derive(Parser)]
#[command(name = "cubeview", about = "Interactive cube viewer")]
struct Cli {
    /// Directory that asset URLs resolve against
    #[arg(long, default_value = ".")]
    asset_root: PathBuf,

    /// Directory exported frames are written to
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,

    /// Export encoding: png or jpg
    #[arg(long, default_value = "png")]
    format: ExportFormat,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 90.0)]
    fov: f32,

    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Uniform scale applied to the secondary model
    #[arg(long)]
    model_scale: Option<f32>,

    /// Log filter, env_logger syntax (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,
}

/// Native file dialog opened in the textures directory.
struct DialogPicker {
    start_dir: PathBuf,
}

impl ResourcePicker for DialogPicker {
    fn pick_background(&mut self) -> Option<String> {
        let path = rfd::FileDialog::new()
            .set_title("Load background")
            .set_directory(&self.start_dir)
            .add_filter("Images", &["png", "jpg", "jpeg", "gif"])
            .pick_file()?;

        if path.parent() != Some(self.start_dir.as_path()) {
            log::warn!(
                "{} is outside {}; only its file name is used",
                path.display(),
                self.start_dir.display()
            );
        }
        let name = path.file_name()?.to_string_lossy().into_owned();
        Some(name)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(match cli.log {
        Some(filter) => LoggingConfig::with_filter(filter),
        None => LoggingConfig::default(),
    });

    let mut config = ViewerConfig {
        asset_root: cli.asset_root,
        export_dir: cli.export_dir,
        export_format: cli.format,
        window_size: (cli.width, cli.height),
        model_scale: cli.model_scale.map(|s| [s; 3]),
        ..ViewerConfig::default()
    };
    config.camera.fov_deg = cli.fov;

    let start_dir = cubeview_engine::assets::resolve_url(&config.asset_root, &config.textures_path);
    log::info!(
        "assets: {}, exports: {} ({})",
        config.asset_root.display(),
        config.export_dir.display(),
        config.export_format
    );

    Viewer::with_config(config)
        .picker(DialogPicker { start_dir })
        .run()
}
