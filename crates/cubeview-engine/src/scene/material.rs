use std::sync::Arc;

use image::RgbaImage;

/// Straight-alpha sRGB color, 8 bits per channel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// `0xRRGGBB`, opaque.
    pub const fn hex(rgb: u32) -> Self {
        Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Channel-wise product, as used for tinting a texel by a material color.
    pub fn modulate(self, other: Color) -> Color {
        let m = |a: u8, b: u8| ((a as u16 * b as u16 + 127) / 255) as u8;
        Color {
            r: m(self.r, other.r),
            g: m(self.g, other.g),
            b: m(self.b, other.b),
            a: m(self.a, other.a),
        }
    }
}

impl From<[u8; 4]> for Color {
    fn from(v: [u8; 4]) -> Self {
        Self { r: v[0], g: v[1], b: v[2], a: v[3] }
    }
}

/// Decoded RGBA image shared between materials and the background.
///
/// Cheap to clone; the pixel data is reference counted and immutable.
#[derive(Debug, Clone)]
pub struct Texture {
    image: Arc<RgbaImage>,
}

impl Texture {
    pub fn new(image: RgbaImage) -> Self {
        Self { image: Arc::new(image) }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Nearest-texel lookup with repeat wrapping. `v = 0` is the bottom row.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        let (w, h) = (self.image.width(), self.image.height());
        if w == 0 || h == 0 || !u.is_finite() || !v.is_finite() {
            return Color::WHITE;
        }
        let u = u - u.floor();
        let v = v - v.floor();
        let x = ((u * w as f32) as u32).min(w - 1);
        let y = (((1.0 - v) * h as f32) as u32).min(h - 1);
        Color::from(self.image.get_pixel(x, y).0)
    }

    /// Texel at integer coordinates, clamped to the image.
    pub fn texel(&self, x: u32, y: u32) -> Color {
        let x = x.min(self.image.width().saturating_sub(1));
        let y = y.min(self.image.height().saturating_sub(1));
        Color::from(self.image.get_pixel(x, y).0)
    }

    pub fn ptr_eq(&self, other: &Texture) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

/// Unlit surface description: a base color optionally modulated by a texture.
#[derive(Debug, Clone)]
pub struct Material {
    pub color: Color,
    pub texture: Option<Texture>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            texture: None,
        }
    }
}

impl Material {
    pub fn color(color: Color) -> Self {
        Self {
            color,
            texture: None,
        }
    }

    pub fn textured(texture: Texture) -> Self {
        Self {
            color: Color::WHITE,
            texture: Some(texture),
        }
    }

    pub fn shade(&self, u: f32, v: f32) -> Color {
        match &self.texture {
            Some(tex) => tex.sample(u, v).modulate(self.color),
            None => self.color,
        }
    }
}
