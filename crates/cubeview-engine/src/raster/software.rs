use glam::{Mat4, Vec2, Vec4};

use crate::scene::{Background, Color, Material, Mesh, PerspectiveCamera, SceneGraph};

use super::{DrawError, DrawSurface, SurfaceSize};

/// Clip-space vertex with its texture coordinate.
#[derive(Debug, Copy, Clone)]
struct ClipVertex {
    pos: Vec4,
    uv: Vec2,
}

impl ClipVertex {
    fn lerp(self, other: ClipVertex, t: f32) -> ClipVertex {
        ClipVertex {
            pos: self.pos.lerp(other.pos, t),
            uv: self.uv.lerp(other.uv, t),
        }
    }
}

/// Screen-space vertex ready for rasterization.
#[derive(Debug, Copy, Clone)]
struct ScreenVertex {
    /// Pixel coordinates, y down.
    xy: Vec2,
    /// Depth in `[0, 1]`.
    z: f32,
    inv_w: f32,
    uv_over_w: Vec2,
}

/// CPU rasterizer with a depth buffer.
///
/// Unlit: each fragment takes `Material::shade` at its perspective-correct UV.
/// Back faces (clockwise on screen) are culled.
#[derive(Debug, Default)]
pub struct SoftwareSurface {
    size: SurfaceSize,
    color: Vec<u8>,
    depth: Vec<f32>,
    triangles_drawn: usize,
}

impl SoftwareSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let mut surface = Self::default();
        surface.resize(SurfaceSize::new(width, height));
        surface
    }

    /// Triangles that reached rasterization during the last draw.
    pub fn triangles_drawn(&self) -> usize {
        self.triangles_drawn
    }

    /// Color at `(x, y)`, `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = (y as usize * self.size.width as usize + x as usize) * 4;
        let p = &self.color[i..i + 4];
        Some(Color::from([p[0], p[1], p[2], p[3]]))
    }

    fn clear(&mut self, background: &Background) {
        let (w, h) = (self.size.width, self.size.height);
        match background {
            Background::Color(c) => {
                let rgba = c.to_array();
                for px in self.color.chunks_exact_mut(4) {
                    px.copy_from_slice(&rgba);
                }
            }
            Background::Texture(tex) => {
                for y in 0..h {
                    let v = 1.0 - (y as f32 + 0.5) / h as f32;
                    for x in 0..w {
                        let u = (x as f32 + 0.5) / w as f32;
                        let i = (y as usize * w as usize + x as usize) * 4;
                        self.color[i..i + 4].copy_from_slice(&tex.sample(u, v).to_array());
                    }
                }
            }
        }
        self.depth.fill(f32::INFINITY);
    }

    fn draw_mesh(&mut self, mesh: &Mesh, mvp: Mat4) {
        let geometry = &*mesh.geometry;
        let has_uvs = geometry.has_uvs();

        let clip: Vec<ClipVertex> = geometry
            .positions
            .iter()
            .enumerate()
            .map(|(i, p)| ClipVertex {
                pos: mvp * p.extend(1.0),
                uv: if has_uvs { geometry.uvs[i] } else { Vec2::ZERO },
            })
            .collect();

        for [a, b, c] in geometry.triangles() {
            let (Some(a), Some(b), Some(c)) = (
                clip.get(a as usize),
                clip.get(b as usize),
                clip.get(c as usize),
            ) else {
                continue;
            };
            if ![a, b, c].iter().all(|v| v.pos.is_finite()) {
                continue;
            }

            let polygon = clip_near([*a, *b, *c]);
            for i in 1..polygon.len().saturating_sub(1) {
                self.raster_triangle([polygon[0], polygon[i], polygon[i + 1]], &mesh.material);
            }
        }
    }

    fn to_screen(&self, v: ClipVertex) -> ScreenVertex {
        let inv_w = 1.0 / v.pos.w;
        let ndc = v.pos.truncate() * inv_w;
        ScreenVertex {
            xy: Vec2::new(
                (ndc.x * 0.5 + 0.5) * self.size.width as f32,
                (0.5 - ndc.y * 0.5) * self.size.height as f32,
            ),
            z: ndc.z,
            inv_w,
            uv_over_w: v.uv * inv_w,
        }
    }

    fn raster_triangle(&mut self, tri: [ClipVertex; 3], material: &Material) {
        let [a, b, c] = tri.map(|v| self.to_screen(v));

        // Screen y points down, so counter-clockwise triangles have negative area here.
        let area = edge(a.xy, b.xy, c.xy);
        if !(area < 0.0) {
            return;
        }
        self.triangles_drawn += 1;

        let (w, h) = (self.size.width as f32, self.size.height as f32);
        let min = a.xy.min(b.xy).min(c.xy).max(Vec2::ZERO);
        let max = a.xy.max(b.xy).max(c.xy).min(Vec2::new(w, h));
        if min.x >= max.x || min.y >= max.y {
            return;
        }

        let (x0, y0) = (min.x.floor() as u32, min.y.floor() as u32);
        let (x1, y1) = (
            (max.x.ceil() as u32).min(self.size.width),
            (max.y.ceil() as u32).min(self.size.height),
        );

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let wa = edge(b.xy, c.xy, p) / area;
                let wb = edge(c.xy, a.xy, p) / area;
                let wc = edge(a.xy, b.xy, p) / area;
                if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                    continue;
                }

                let z = wa * a.z + wb * b.z + wc * c.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }
                let i = y as usize * self.size.width as usize + x as usize;
                if z >= self.depth[i] {
                    continue;
                }

                let inv_w = wa * a.inv_w + wb * b.inv_w + wc * c.inv_w;
                let uv = (a.uv_over_w * wa + b.uv_over_w * wb + c.uv_over_w * wc) / inv_w;

                self.depth[i] = z;
                self.color[i * 4..i * 4 + 4].copy_from_slice(&material.shade(uv.x, uv.y).to_array());
            }
        }
    }
}

impl DrawSurface for SoftwareSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.color = vec![0; size.area() * 4];
        self.depth = vec![f32::INFINITY; size.area()];
    }

    fn draw(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), DrawError> {
        self.triangles_drawn = 0;
        if self.size.is_empty() {
            return Ok(());
        }

        self.clear(scene.background());

        let view_proj = camera.view_projection();
        scene.visit_meshes(&mut |mesh, world| self.draw_mesh(mesh, view_proj * world));
        Ok(())
    }

    fn pixels(&self) -> &[u8] {
        &self.color
    }
}

/// Twice the signed area of `(a, b, p)`.
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Clips a triangle against the near plane (`z >= 0` in clip space).
fn clip_near(tri: [ClipVertex; 3]) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let cur = tri[i];
        let next = tri[(i + 1) % 3];
        let (dc, dn) = (cur.pos.z, next.pos.z);

        if dc >= 0.0 {
            out.push(cur);
        }
        if (dc >= 0.0) != (dn >= 0.0) {
            out.push(cur.lerp(next, dc / (dc - dn)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::raster::ExportFormat;
    use crate::scene::{Geometry, Node, Texture, Transform};

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    fn camera() -> PerspectiveCamera {
        let mut cam = PerspectiveCamera::new(90.0, 1.0, 1.0, 1000.0);
        cam.position = Vec3::new(0.0, 0.0, 5.0);
        cam
    }

    fn cube(color: Color, position: Vec3) -> Node {
        Node::mesh(
            "cube",
            Arc::new(Geometry::cuboid(2.0, 2.0, 2.0)),
            Material::color(color),
        )
        .with_transform(Transform::from_position(position))
    }

    fn triangle(clockwise: bool) -> Geometry {
        let mut g = Geometry {
            positions: vec![Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            uvs: Vec::new(),
            indices: vec![0, 1, 2],
        };
        if clockwise {
            g.indices = vec![0, 2, 1];
        }
        g
    }

    // ----------------------------------------------------------------------------
    // clear + sizing

    #[test]
    fn zero_size_draws_nothing() {
        let mut surface = SoftwareSurface::new(0, 0);
        let mut scene = SceneGraph::new();
        scene.add(cube(RED, Vec3::ZERO));
        let mut cam = camera();
        cam.set_aspect_from(0, 0);

        surface.draw(&scene, &cam).unwrap();
        assert!(surface.pixels().is_empty());
        assert_eq!(surface.triangles_drawn(), 0);
    }

    #[test]
    fn background_color_fills_surface() {
        let mut surface = SoftwareSurface::new(8, 4);
        let mut scene = SceneGraph::new();
        scene.set_background(Background::Color(Color::WHITE));
        surface.draw(&scene, &camera()).unwrap();
        assert!(surface.pixels().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn background_texture_is_stretched() {
        let mut img = RgbaImage::new(1, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));

        let mut surface = SoftwareSurface::new(6, 6);
        let mut scene = SceneGraph::new();
        scene.set_background(Background::Texture(Texture::new(img)));
        surface.draw(&scene, &camera()).unwrap();

        assert_eq!(surface.pixel(0, 0), Some(RED));
        assert_eq!(surface.pixel(5, 5), Some(BLUE));
    }

    #[test]
    fn resize_reallocates() {
        let mut surface = SoftwareSurface::new(2, 2);
        surface.resize(SurfaceSize::new(3, 5));
        assert_eq!(surface.pixels().len(), 3 * 5 * 4);
        assert!(surface.pixel(2, 4).is_some());
        assert_eq!(surface.pixel(3, 0), None);
    }

    // ----------------------------------------------------------------------------
    // geometry

    #[test]
    fn cube_covers_centre() {
        let mut surface = SoftwareSurface::new(32, 32);
        let mut scene = SceneGraph::new();
        scene.set_background(Background::Color(Color::WHITE));
        scene.add(cube(RED, Vec3::ZERO));
        surface.draw(&scene, &camera()).unwrap();

        assert_eq!(surface.pixel(16, 16), Some(RED));
        assert_eq!(surface.pixel(0, 0), Some(Color::WHITE));
        // Front face only: two triangles.
        assert_eq!(surface.triangles_drawn(), 2);
    }

    #[test]
    fn nearer_geometry_wins_regardless_of_order() {
        let mut scene = SceneGraph::new();
        scene.add(cube(RED, Vec3::new(0.0, 0.0, 1.0)));
        scene.add(cube(BLUE, Vec3::new(0.0, 0.0, -2.0)));

        let mut surface = SoftwareSurface::new(32, 32);
        surface.draw(&scene, &camera()).unwrap();
        assert_eq!(surface.pixel(16, 16), Some(RED));

        let mut reversed = SceneGraph::new();
        reversed.add(cube(BLUE, Vec3::new(0.0, 0.0, -2.0)));
        reversed.add(cube(RED, Vec3::new(0.0, 0.0, 1.0)));
        surface.draw(&reversed, &camera()).unwrap();
        assert_eq!(surface.pixel(16, 16), Some(RED));
    }

    #[test]
    fn back_faces_are_culled() {
        let mut surface = SoftwareSurface::new(16, 16);
        let mut scene = SceneGraph::new();
        scene.add(Node::mesh("front", Arc::new(triangle(false)), Material::color(RED)));
        surface.draw(&scene, &camera()).unwrap();
        assert_eq!(surface.triangles_drawn(), 1);

        let mut scene = SceneGraph::new();
        scene.add(Node::mesh("back", Arc::new(triangle(true)), Material::color(RED)));
        surface.draw(&scene, &camera()).unwrap();
        assert_eq!(surface.triangles_drawn(), 0);
        assert_eq!(surface.pixel(8, 8), Some(Color::BLACK));
    }

    #[test]
    fn geometry_behind_near_plane_is_clipped() {
        let mut surface = SoftwareSurface::new(16, 16);
        let mut scene = SceneGraph::new();
        scene.set_background(Background::Color(Color::WHITE));
        // Large floor that passes under and behind the camera.
        let floor = Node::mesh(
            "floor",
            Arc::new(Geometry::cuboid(100.0, 0.1, 100.0)),
            Material::color(BLUE),
        )
        .with_transform(Transform::from_position(Vec3::new(0.0, -2.0, 0.0)));
        scene.add(floor);
        surface.draw(&scene, &camera()).unwrap();

        assert_eq!(surface.pixel(8, 15), Some(BLUE));
        assert_eq!(surface.pixel(8, 0), Some(Color::WHITE));
    }

    #[test]
    fn textured_face_samples_texture() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));

        let mut surface = SoftwareSurface::new(64, 64);
        let mut scene = SceneGraph::new();
        scene.add(Node::mesh(
            "cube",
            Arc::new(Geometry::cuboid(2.0, 2.0, 2.0)),
            Material::textured(Texture::new(img)),
        ));
        surface.draw(&scene, &camera()).unwrap();

        // Front face maps u left to right.
        assert_eq!(surface.pixel(28, 32), Some(RED));
        assert_eq!(surface.pixel(36, 32), Some(BLUE));
    }

    #[test]
    fn non_finite_vertices_are_skipped() {
        let mut g = triangle(false);
        g.positions[0] = Vec3::new(f32::NAN, 0.0, 0.0);
        let mut surface = SoftwareSurface::new(8, 8);
        let mut scene = SceneGraph::new();
        scene.add(Node::mesh("bad", Arc::new(g), Material::color(RED)));
        surface.draw(&scene, &camera()).unwrap();
        assert_eq!(surface.triangles_drawn(), 0);
    }

    // ----------------------------------------------------------------------------
    // readback

    #[test]
    fn readback_follows_rotation() {
        let mut surface = SoftwareSurface::new(48, 48);
        let mut scene = SceneGraph::new();
        scene.set_background(Background::Color(Color::WHITE));
        let id = scene.add(cube(RED, Vec3::ZERO));
        let cam = camera();

        surface.draw(&scene, &cam).unwrap();
        let before = surface.read_pixels(ExportFormat::Png).unwrap();

        if let Some(node) = scene.node_mut(id) {
            node.transform.rotation.y += 0.5;
        }
        surface.draw(&scene, &cam).unwrap();
        let after = surface.read_pixels(ExportFormat::Png).unwrap();

        assert_ne!(before, after);
    }
}
