use std::f32::consts::FRAC_PI_2;
use std::path::PathBuf;

use cubeview_engine::raster::ExportFormat;
use cubeview_engine::scene::Color;

/// Camera parameters fixed at construction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Camera height above the origin.
    pub offset_y: f32,
    /// Camera distance along +Z.
    pub offset_z: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 90.0,
            near: 1.0,
            far: 1000.0,
            offset_y: 3.0,
            offset_z: 10.0,
        }
    }
}

/// Viewer configuration.
///
/// Everything here is fixed for the lifetime of a view except the export
/// format, which can be toggled at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub title: String,
    /// Initial window size in logical pixels.
    pub window_size: (f64, f64),
    pub camera: CameraConfig,

    /// Directory that asset URLs resolve against.
    pub asset_root: PathBuf,
    /// URL prefix for user-selected background images.
    pub textures_path: String,
    pub cube_texture_url: String,
    pub wall_texture_url: String,
    /// Secondary model, drawn with the wall material.
    pub model_url: String,
    pub model_scale: Option<[f32; 3]>,
    pub background: Color,

    pub export_format: ExportFormat,
    pub export_dir: PathBuf,

    /// Units per second.
    pub movement_speed: f32,
    /// Radians per second.
    pub rotation_speed: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "cubeview".to_string(),
            window_size: (1280.0, 720.0),
            camera: CameraConfig::default(),
            asset_root: PathBuf::from("."),
            textures_path: "/assets/".to_string(),
            cube_texture_url: "/assets/texture.jpg".to_string(),
            wall_texture_url: "/assets/crate.gif".to_string(),
            model_url: "./assets/stair.gltf".to_string(),
            model_scale: None,
            background: Color::WHITE,
            export_format: ExportFormat::Png,
            export_dir: PathBuf::from("."),
            movement_speed: 20.0,
            rotation_speed: FRAC_PI_2,
        }
    }
}

impl ViewerConfig {
    /// URL of a background image picked by file name.
    pub fn background_url(&self, file_name: &str) -> String {
        format!("{}{}", self.textures_path, file_name)
    }
}
