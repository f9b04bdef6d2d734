//! cubeview engine crate.
//!
//! Platform + runtime pieces used by the viewer: winit window loop, wgpu frame
//! presentation, keyboard/pointer input, timing, the scene graph, the software
//! draw surface and asynchronous resource loading.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod render;
pub mod raster;
pub mod scene;
pub mod assets;
