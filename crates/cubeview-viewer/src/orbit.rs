use std::f32::consts::PI;

use glam::Vec3;

use cubeview_engine::input::{MouseButton, PointerFrame, PointerState};
use cubeview_engine::scene::PerspectiveCamera;

/// Keeps the polar angle off the poles so `look_at` stays well defined.
const POLAR_EPSILON: f32 = 1e-3;

/// Mouse orbit around a fixed target.
///
/// Left-drag rotates the camera on a sphere around the target; the wheel
/// moves it along the view ray. The camera always looks at the target.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    /// Radians per logical pixel of drag.
    pub rotate_speed: f32,
    /// Fraction of the distance covered per wheel line.
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    radius: f32,
    azimuth: f32,
    polar: f32,
}

impl OrbitControls {
    /// Derives the spherical position from the camera's current placement.
    pub fn new(camera: &PerspectiveCamera, target: Vec3) -> Self {
        let mut controls = Self {
            target,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            min_distance: camera.near,
            max_distance: camera.far,
            radius: 1.0,
            azimuth: 0.0,
            polar: PI / 2.0,
        };
        controls.sync_from(camera);
        controls
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    fn sync_from(&mut self, camera: &PerspectiveCamera) {
        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }
        self.radius = radius;
        self.azimuth = offset.x.atan2(offset.z);
        self.polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
    }

    /// Points the camera at the target from the stored spherical position.
    pub fn apply_to(&self, camera: &mut PerspectiveCamera) {
        let sin_polar = self.polar.sin();
        let offset = Vec3::new(
            self.radius * sin_polar * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            self.radius * sin_polar * self.azimuth.cos(),
        );
        camera.position = self.target + offset;
        camera.target = self.target;
    }

    /// Rotates by a drag in logical pixels and zooms by wheel lines.
    ///
    /// Dragging right swings the camera left around the target, like grabbing the scene.
    pub fn rotate_and_zoom(&mut self, drag: (f32, f32), wheel_lines: f32) {
        self.azimuth -= drag.0 * self.rotate_speed;
        self.polar = (self.polar - drag.1 * self.rotate_speed).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        if wheel_lines != 0.0 {
            let scale = (1.0 - self.zoom_speed).powf(wheel_lines);
            self.radius = (self.radius * scale).clamp(self.min_distance, self.max_distance);
        }
    }

    /// Applies this frame's pointer input. Returns true when the camera moved.
    pub fn update(
        &mut self,
        camera: &mut PerspectiveCamera,
        pointer: &PointerState,
        frame: &PointerFrame,
    ) -> bool {
        let drag = if pointer.button_down(MouseButton::Left) {
            frame.motion
        } else {
            (0.0, 0.0)
        };
        if drag == (0.0, 0.0) && frame.wheel_lines == 0.0 {
            return false;
        }
        self.rotate_and_zoom(drag, frame.wheel_lines);
        self.apply_to(camera);
        true
    }
}
