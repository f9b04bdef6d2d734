use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading a resource.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("glTF parse error: {0}")]
    GltfParse(#[from] serde_json::Error),

    #[error("invalid base64 buffer: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unsupported glTF content: {0}")]
    Unsupported(String),

    #[error("glTF accessor {accessor} is out of bounds")]
    OutOfBounds { accessor: usize },

    #[error("worker thread could not be started")]
    Spawn(#[source] std::io::Error),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetError::Io {
            path: path.into(),
            source,
        }
    }
}
