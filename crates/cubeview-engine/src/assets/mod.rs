//! Resource loading.
//!
//! Loads images and glTF models by URL off the frame thread. Completions are
//! queued and applied to the scene at a tick boundary by `ResourceLoader::pump`.

mod error;
mod gltf;
mod loader;
mod path;

pub use error::AssetError;
pub use gltf::load_gltf;
pub use loader::{Completion, Resource, ResourceKind, ResourceLoader, ThreadedLoader, Ticket};
pub use path::resolve_url;

use std::path::Path;

use crate::scene::Texture;

/// Decodes an image file (png, jpeg or gif) into a texture.
pub fn load_image(path: &Path) -> Result<Texture, AssetError> {
    let image = image::open(path).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Texture::new(image.to_rgba8()))
}
