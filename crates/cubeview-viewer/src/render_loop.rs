use std::cell::Cell;
use std::rc::Rc;

use glam::Vec3;

use cubeview_engine::input::KeyboardTracker;
use cubeview_engine::raster::DrawSurface;
use cubeview_engine::scene::{NodeId, PerspectiveCamera, SceneGraph};
use cubeview_engine::time::{Clock, MonotonicSource, TimeSource};

use crate::bindings::{default_motion_bindings, MotionBinding, MotionTarget};

/// Scheduling state of a `RenderLoop`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    /// Constructed, no tick scheduled yet.
    Idle,
    /// Ticking once per display refresh.
    Running,
    /// Cancelled by the host; never runs again.
    Stopped,
}

/// Cancels a running loop from outside the frame callback.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Rc<Cell<bool>>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Per-second rates of the controlled object.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MotionSpeeds {
    pub movement: f32,
    pub rotation: f32,
}

/// What a tick did.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TickReport {
    /// Seconds consumed from the clock.
    pub elapsed: f32,
    pub moved: Vec3,
    pub rotated: Vec3,
    /// False when the draw call failed; the loop keeps running regardless.
    pub drawn: bool,
}

/// Everything a tick reads or mutates, borrowed from the owning controller.
pub struct TickTarget<'a> {
    pub keyboard: &'a KeyboardTracker,
    pub scene: &'a mut SceneGraph,
    pub controlled: NodeId,
    pub camera: &'a mut PerspectiveCamera,
    pub surface: &'a mut dyn DrawSurface,
}

/// Timed update/render cycle.
///
/// Each tick samples the clock, applies every held motion chord scaled by the
/// elapsed seconds, refreshes the camera aspect from the surface and draws.
pub struct RenderLoop<S: TimeSource = MonotonicSource> {
    clock: Clock<S>,
    speeds: MotionSpeeds,
    bindings: Vec<MotionBinding>,
    state: LoopState,
    cancel: CancelHandle,
    ticks: u64,
}

impl<S: TimeSource> RenderLoop<S> {
    pub fn new(clock: Clock<S>, speeds: MotionSpeeds) -> Self {
        Self {
            clock,
            speeds,
            bindings: default_motion_bindings(),
            state: LoopState::Idle,
            cancel: CancelHandle::default(),
            ticks: 0,
        }
    }

    pub fn with_bindings(mut self, bindings: Vec<MotionBinding>) -> Self {
        self.bindings = bindings;
        self
    }

    /// Idle -> Running. Returns the handle that stops the loop.
    ///
    /// Starting twice is a no-op; a stopped loop stays stopped.
    pub fn start(&mut self) -> CancelHandle {
        match self.state() {
            LoopState::Idle => {
                self.state = LoopState::Running;
                log::info!("render loop started");
            }
            LoopState::Running => {}
            LoopState::Stopped => log::warn!("render loop already stopped; not restarting"),
        }
        self.cancel.clone()
    }

    pub fn stop(&mut self) {
        if self.state() != LoopState::Stopped {
            self.cancel.cancel();
            self.state = LoopState::Stopped;
            log::info!("render loop stopped after {} ticks", self.ticks);
        }
    }

    pub fn state(&self) -> LoopState {
        if self.cancel.is_cancelled() {
            LoopState::Stopped
        } else {
            self.state
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn speeds(&self) -> MotionSpeeds {
        self.speeds
    }

    /// Runs one tick. Returns `None` unless the loop is running.
    pub fn tick(&mut self, target: TickTarget<'_>) -> Option<TickReport> {
        if !self.is_running() {
            return None;
        }
        self.ticks += 1;

        let elapsed = self.clock.sample();
        let move_distance = self.speeds.movement * elapsed;
        let rotate_angle = self.speeds.rotation * elapsed;

        // Summed per component first so opposite chords cancel exactly.
        let mut moved = Vec3::ZERO;
        let mut rotated = Vec3::ZERO;
        for binding in &self.bindings {
            if !target.keyboard.chord_held(&binding.chord) {
                continue;
            }
            match binding.target {
                MotionTarget::Move(axis) => moved[axis.index()] += binding.sign * move_distance,
                MotionTarget::Rotate(axis) => rotated[axis.index()] += binding.sign * rotate_angle,
            }
        }

        if let Some(node) = target.scene.node_mut(target.controlled) {
            node.transform.position += moved;
            node.transform.rotation += rotated;
        }

        let size = target.surface.size();
        target.camera.set_aspect_from(size.width, size.height);

        let drawn = match target.surface.draw(target.scene, target.camera) {
            Ok(()) => true,
            Err(err) => {
                log::error!("tick {}: draw failed: {err}", self.ticks);
                false
            }
        };

        Some(TickReport {
            elapsed,
            moved,
            rotated,
            drawn,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;
    use std::sync::Arc;

    use super::*;
    use crate::bindings::{Action, ActionBindings, Axis};
    use cubeview_engine::input::{InputEvent, InputHub, KeyCode, Modifiers};
    use cubeview_engine::raster::{DrawError, SoftwareSurface, SurfaceSize};
    use cubeview_engine::scene::{Geometry, Material, Node, Transform};
    use cubeview_engine::time::ManualSource;

    const SPEEDS: MotionSpeeds = MotionSpeeds {
        movement: 20.0,
        rotation: FRAC_PI_2,
    };

    struct Rig {
        time: ManualSource,
        hub: InputHub,
        keyboard: KeyboardTracker,
        scene: SceneGraph,
        cube: NodeId,
        camera: PerspectiveCamera,
        surface: SoftwareSurface,
        render_loop: RenderLoop<ManualSource>,
    }

    impl Rig {
        fn new() -> Self {
            let time = ManualSource::new();
            let hub = InputHub::new();
            let keyboard = KeyboardTracker::attach(&hub);
            let mut scene = SceneGraph::new();
            let cube = scene.add(
                Node::mesh("cube", Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)), Material::default())
                    .with_transform(Transform::from_position(Vec3::new(0.0, 1.0, 0.0))),
            );
            let mut camera = PerspectiveCamera::new(90.0, 1.0, 1.0, 1000.0);
            camera.position = Vec3::new(0.0, 3.0, 10.0);

            let render_loop = RenderLoop::new(Clock::with_source(time.clone()), SPEEDS);
            Self {
                time,
                hub,
                keyboard,
                scene,
                cube,
                camera,
                surface: SoftwareSurface::new(16, 12),
                render_loop,
            }
        }

        fn press(&self, code: KeyCode) {
            self.hub.dispatch(&InputEvent::key_down(code, Modifiers::default()));
        }

        fn release(&self, code: KeyCode) {
            self.hub.dispatch(&InputEvent::key_up(code, Modifiers::default()));
        }

        fn tick_after(&mut self, secs: f32) -> Option<TickReport> {
            self.time.advance_secs(secs);
            self.render_loop.tick(TickTarget {
                keyboard: &self.keyboard,
                scene: &mut self.scene,
                controlled: self.cube,
                camera: &mut self.camera,
                surface: &mut self.surface,
            })
        }

        fn cube(&self) -> Transform {
            self.scene.node(self.cube).map(|n| n.transform).unwrap()
        }
    }

    // ----------------------------------------------------------------------------
    // lifecycle

    #[test]
    fn idle_loop_does_not_tick() {
        let mut rig = Rig::new();
        assert_eq!(rig.render_loop.state(), LoopState::Idle);
        rig.press(KeyCode::RIGHT);
        assert!(rig.tick_after(0.5).is_none());
        assert_eq!(rig.cube().position.x, 0.0);
        assert_eq!(rig.render_loop.ticks(), 0);
    }

    #[test]
    fn cancel_handle_stops_for_good() {
        let mut rig = Rig::new();
        let handle = rig.render_loop.start();
        assert!(rig.tick_after(0.1).is_some());

        handle.cancel();
        assert_eq!(rig.render_loop.state(), LoopState::Stopped);
        assert!(rig.tick_after(0.1).is_none());

        rig.render_loop.start();
        assert_eq!(rig.render_loop.state(), LoopState::Stopped);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut rig = Rig::new();
        rig.render_loop.start();
        rig.render_loop.stop();
        rig.render_loop.stop();
        assert!(!rig.render_loop.is_running());
    }

    // ----------------------------------------------------------------------------
    // motion

    #[test]
    fn deltas_scale_linearly_with_elapsed_time() {
        let mut rig = Rig::new();
        rig.render_loop.start();
        rig.tick_after(0.0);
        rig.press(KeyCode::RIGHT);
        rig.press(KeyCode::letter(b'Q'));

        let a = rig.tick_after(0.05).unwrap();
        let b = rig.tick_after(0.2).unwrap();

        let ratio = b.elapsed / a.elapsed;
        assert!((b.moved.x - a.moved.x * ratio).abs() < 1e-4);
        assert!((b.rotated.y - a.rotated.y * ratio).abs() < 1e-4);
        assert!((a.moved.x - 20.0 * a.elapsed).abs() < 1e-5);
        assert!((a.rotated.y - FRAC_PI_2 * a.elapsed).abs() < 1e-5);
    }

    #[test]
    fn opposite_chords_cancel_exactly() {
        let mut rig = Rig::new();
        rig.render_loop.start();
        rig.tick_after(0.0);
        {
            let node = rig.scene.node_mut(rig.cube).unwrap();
            node.transform.position.x = 0.3;
            node.transform.rotation.y = 0.7;
        }
        rig.press(KeyCode::LEFT);
        rig.press(KeyCode::RIGHT);
        rig.press(KeyCode::letter(b'Q'));
        rig.press(KeyCode::letter(b'A'));

        let report = rig.tick_after(0.0333).unwrap();
        assert_eq!(report.moved, Vec3::ZERO);
        assert_eq!(report.rotated, Vec3::ZERO);
        assert_eq!(rig.cube().position.x, 0.3);
        assert_eq!(rig.cube().rotation.y, 0.7);
    }

    #[test]
    fn simultaneous_chords_combine() {
        let mut rig = Rig::new();
        rig.render_loop.start();
        rig.tick_after(0.0);
        rig.press(KeyCode::RIGHT);
        rig.press(KeyCode::UP);
        rig.press(KeyCode::letter(b'W'));
        rig.press(KeyCode::letter(b'D'));

        rig.tick_after(0.5);
        let t = rig.cube();
        assert!((t.position.x - 10.0).abs() < 1e-4);
        assert!((t.position.z + 10.0).abs() < 1e-4);
        assert!((t.rotation.x - FRAC_PI_2 * 0.5).abs() < 1e-5);
        assert!((t.rotation.z + FRAC_PI_2 * 0.5).abs() < 1e-5);
        // Untouched components stay put.
        assert_eq!(t.position.y, 1.0);
    }

    #[test]
    fn released_chord_stops_motion() {
        let mut rig = Rig::new();
        rig.render_loop.start();
        rig.tick_after(0.0);
        rig.press(KeyCode::DOWN);
        rig.tick_after(0.1);
        let z = rig.cube().position.z;
        rig.release(KeyCode::DOWN);
        rig.tick_after(0.1);
        assert_eq!(rig.cube().position.z, z);
    }

    #[test]
    fn large_gap_is_not_clamped() {
        let mut rig = Rig::new();
        rig.render_loop.start();
        rig.tick_after(0.0);
        rig.press(KeyCode::RIGHT);
        let report = rig.tick_after(30.0).unwrap();
        assert!((report.elapsed - 30.0).abs() < 1e-3);
        assert!((rig.cube().position.x - 600.0).abs() < 1e-2);
    }

    #[test]
    fn export_hotkey_leaves_object_still() {
        let mut rig = Rig::new();
        let mut actions = ActionBindings::default();
        rig.render_loop.start();
        rig.tick_after(0.0);

        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        rig.hub.dispatch(&InputEvent::key_down(KeyCode::CTRL, ctrl));
        rig.hub.dispatch(&InputEvent::key_down(KeyCode::letter(b'P'), ctrl));

        assert_eq!(actions.poll(&rig.keyboard), vec![Action::ExportFrame]);
        let report = rig.tick_after(0.25).unwrap();
        assert_eq!(report.rotated, Vec3::ZERO);
        assert_eq!(report.moved, Vec3::ZERO);
        assert_eq!(rig.cube().rotation, Vec3::ZERO);
    }

    #[test]
    fn custom_bindings_replace_defaults() {
        let mut rig = Rig::new();
        rig.render_loop = RenderLoop::new(Clock::with_source(rig.time.clone()), SPEEDS)
            .with_bindings(vec![MotionBinding::new("shift+space", MotionTarget::Move(Axis::Y), 1.0)]);
        assert_eq!(rig.render_loop.speeds(), SPEEDS);
        rig.render_loop.start();
        rig.tick_after(0.0);

        // Default chords no longer apply.
        rig.press(KeyCode::RIGHT);
        let report = rig.tick_after(0.1).unwrap();
        assert_eq!(report.moved, Vec3::ZERO);

        let shift = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        rig.hub.dispatch(&InputEvent::key_down(KeyCode::SHIFT, shift));
        rig.hub.dispatch(&InputEvent::key_down(KeyCode::SPACE, shift));
        let report = rig.tick_after(0.5).unwrap();
        assert!((report.moved.y - SPEEDS.movement * 0.5).abs() < 1e-4);
        assert!((rig.cube().position.y - (1.0 + SPEEDS.movement * 0.5)).abs() < 1e-4);
    }

    // ----------------------------------------------------------------------------
    // drawing

    #[test]
    fn aspect_follows_surface_before_draw() {
        let mut rig = Rig::new();
        rig.render_loop.start();
        rig.surface.resize(SurfaceSize::new(40, 10));
        rig.tick_after(0.016);
        assert!((rig.camera.aspect - 4.0).abs() < 1e-6);
    }

    #[test]
    fn zero_size_surface_is_tolerated() {
        let mut rig = Rig::new();
        rig.render_loop.start();
        rig.surface.resize(SurfaceSize::new(0, 0));
        let report = rig.tick_after(0.016).unwrap();
        assert!(report.drawn);
        assert!(!rig.camera.aspect.is_finite());

        rig.surface.resize(SurfaceSize::new(8, 8));
        rig.tick_after(0.016);
        assert_eq!(rig.camera.aspect, 1.0);
    }

    struct FailingSurface {
        failures: u32,
    }

    impl DrawSurface for FailingSurface {
        fn size(&self) -> SurfaceSize {
            SurfaceSize::new(4, 4)
        }

        fn resize(&mut self, _size: SurfaceSize) {}

        fn draw(&mut self, _scene: &SceneGraph, _camera: &PerspectiveCamera) -> Result<(), DrawError> {
            self.failures += 1;
            Err(DrawError::EmptySurface { width: 0, height: 0 })
        }

        fn pixels(&self) -> &[u8] {
            &[]
        }
    }

    #[test]
    fn draw_failure_skips_only_that_frame() {
        let mut rig = Rig::new();
        rig.render_loop.start();
        rig.tick_after(0.0);
        rig.press(KeyCode::RIGHT);

        let mut failing = FailingSurface { failures: 0 };
        for _ in 0..3 {
            rig.time.advance_secs(0.1);
            let report = rig
                .render_loop
                .tick(TickTarget {
                    keyboard: &rig.keyboard,
                    scene: &mut rig.scene,
                    controlled: rig.cube,
                    camera: &mut rig.camera,
                    surface: &mut failing,
                })
                .unwrap();
            assert!(!report.drawn);
        }
        assert_eq!(failing.failures, 3);
        assert!(rig.render_loop.is_running());
        assert!((rig.cube().position.x - 6.0).abs() < 1e-4);
    }
}
