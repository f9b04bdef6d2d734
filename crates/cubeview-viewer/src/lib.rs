//! Interactive cube viewer on top of `cubeview-engine`.
//!
//! One window shows a textured cube between two walls. The cube is driven
//! from the keyboard:
//!
//! | chord          | effect              |
//! |----------------|---------------------|
//! | `Q` / `A`      | rotate about Y ±    |
//! | `W` / `S`      | rotate about X ±    |
//! | `E` / `D`      | rotate about Z ±    |
//! | `left`/`right` | move along X −/+    |
//! | `up`/`down`    | move along Z −/+    |
//! | `ctrl+o`       | load a background   |
//! | `ctrl+p`       | export the frame    |
//! | `ctrl+t`       | toggle png/jpg      |
//!
//! Left-drag orbits the camera and the wheel zooms.
//!
//! ```rust,ignore
//! cubeview_viewer::Viewer::new()
//!     .asset_root("./site")
//!     .run()?;
//! ```

pub mod app;
pub mod bindings;
pub mod config;
pub mod export;
pub mod materials;
pub mod orbit;
pub mod picker;
pub mod render_loop;
pub mod viewport;

pub use app::Viewer;
pub use config::{CameraConfig, ViewerConfig};
pub use export::{DirectorySink, ExportSink};
pub use picker::{NoPicker, ResourcePicker};
pub use render_loop::{CancelHandle, LoopState, RenderLoop};
pub use viewport::ViewportController;
