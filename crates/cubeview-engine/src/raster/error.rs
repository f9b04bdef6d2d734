use thiserror::Error;

/// Failures of a draw surface.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("surface is empty ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("failed to encode {format} image")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
}
