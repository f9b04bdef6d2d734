use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, RgbaImage};

use super::{DrawError, SurfaceSize};

const JPEG_QUALITY: u8 = 92;

/// Raster encoding used for frame readback.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }

    /// Fixed file name an export is saved under.
    pub const fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Png => "export.png",
            ExportFormat::Jpeg => "export.jpg",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            ExportFormat::Png => ExportFormat::Jpeg,
            ExportFormat::Jpeg => ExportFormat::Png,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            other => Err(format!("unknown export format `{other}` (expected png or jpg)")),
        }
    }
}

pub(super) fn encode(
    size: SurfaceSize,
    pixels: &[u8],
    format: ExportFormat,
) -> Result<Vec<u8>, DrawError> {
    if size.is_empty() {
        return Err(DrawError::EmptySurface {
            width: size.width,
            height: size.height,
        });
    }
    let expected = size.area() * 4;
    let image = RgbaImage::from_raw(size.width, size.height, pixels.to_vec()).ok_or(
        DrawError::BufferSize {
            expected,
            actual: pixels.len(),
        },
    )?;

    let mut out = Cursor::new(Vec::new());
    let result = match format {
        ExportFormat::Png => PngEncoder::new(&mut out).write_image(
            image.as_raw(),
            size.width,
            size.height,
            image::ExtendedColorType::Rgba8,
        ),
        // JPEG carries no alpha channel.
        ExportFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
            JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).write_image(
                rgb.as_raw(),
                size.width,
                size.height,
                image::ExtendedColorType::Rgb8,
            )
        }
    };
    result.map_err(|source| DrawError::Encode {
        format: format.extension(),
        source,
    })?;

    Ok(out.into_inner())
}
