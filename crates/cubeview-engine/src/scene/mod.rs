//! Scene graph.
//!
//! Holds positionable/rotatable objects, their meshes and materials, the
//! background and the camera description. Renderer-agnostic: the raster
//! module consumes it.

mod camera;
mod geometry;
mod graph;
mod material;
mod transform;

pub use camera::PerspectiveCamera;
pub use geometry::Geometry;
pub use graph::{Background, Mesh, Node, NodeId, SceneGraph};
pub use material::{Color, Material, Texture};
pub use transform::Transform;
