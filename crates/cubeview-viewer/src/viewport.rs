use std::f32::consts::FRAC_PI_2;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use glam::Vec3;

use cubeview_engine::assets::{Resource, ResourceKind, ResourceLoader, Ticket};
use cubeview_engine::input::{InputHub, KeyboardTracker, PointerFrame, PointerState};
use cubeview_engine::raster::{DrawSurface, ExportFormat, SurfaceSize};
use cubeview_engine::scene::{
    Background, Geometry, Material, Node, NodeId, PerspectiveCamera, SceneGraph, Transform,
};
use cubeview_engine::time::{Clock, MonotonicSource, TimeSource};

use crate::config::ViewerConfig;
use crate::export::ExportSink;
use crate::materials::SharedMaterial;
use crate::orbit::OrbitControls;
use crate::picker::ResourcePicker;
use crate::render_loop::{CancelHandle, LoopState, MotionSpeeds, RenderLoop, TickReport, TickTarget};

/// Owns one view: scene, camera, draw surface and the render loop driving them.
///
/// Built once per window. `frame` is called on every display refresh; the
/// user actions (`load_background`, `export_frame`) may be called between frames.
pub struct ViewportController<S: TimeSource = MonotonicSource> {
    config: ViewerConfig,
    scene: SceneGraph,
    camera: PerspectiveCamera,
    orbit: OrbitControls,
    surface: Box<dyn DrawSurface>,
    loader: Box<dyn ResourceLoader>,
    keyboard: Option<KeyboardTracker>,
    render_loop: RenderLoop<S>,
    cube: NodeId,
    cube_material: SharedMaterial,
    wall_material: SharedMaterial,
    export_format: ExportFormat,
}

impl<S: TimeSource> ViewportController<S> {
    /// Builds the static scene, attaches keyboard tracking to `input` and
    /// requests the textures and the secondary model.
    pub fn new(
        config: ViewerConfig,
        input: &InputHub,
        surface: Box<dyn DrawSurface>,
        loader: Box<dyn ResourceLoader>,
        clock: Clock<S>,
    ) -> Self {
        let mut scene = SceneGraph::new();
        scene.set_background(Background::Color(config.background));

        let cube_material = SharedMaterial::new(Material::default());
        let wall_material = SharedMaterial::new(Material::default());

        let cube = scene.add(
            Node::mesh("cube", Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)), cube_material.material())
                .with_transform(Transform::from_position(Vec3::new(0.0, 1.0, 0.0))),
        );
        cube_material.bind(&mut scene, cube);

        let wall_geometry = Arc::new(Geometry::cuboid(10.0, 10.0, 2.0));
        let walls = [
            Transform::from_position(Vec3::new(0.0, 5.0, -6.0)),
            Transform::from_position(Vec3::new(6.0, 5.0, 0.0))
                .with_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0)),
        ];
        for (i, transform) in walls.into_iter().enumerate() {
            let id = scene.add(
                Node::mesh(format!("wall-{i}"), wall_geometry.clone(), wall_material.material())
                    .with_transform(transform),
            );
            wall_material.bind(&mut scene, id);
        }

        let cam = &config.camera;
        let mut camera = PerspectiveCamera::new(cam.fov_deg, 1.0, cam.near, cam.far);
        camera.position = Vec3::new(0.0, cam.offset_y, cam.offset_z);
        camera.set_aspect_from(surface.size().width, surface.size().height);
        let orbit = OrbitControls::new(&camera, Vec3::ZERO);
        orbit.apply_to(&mut camera);

        let render_loop = RenderLoop::new(
            clock,
            MotionSpeeds {
                movement: config.movement_speed,
                rotation: config.rotation_speed,
            },
        );

        let mut controller = Self {
            export_format: config.export_format,
            config,
            scene,
            camera,
            orbit,
            surface,
            loader,
            keyboard: Some(KeyboardTracker::attach(input)),
            render_loop,
            cube,
            cube_material,
            wall_material,
        };
        controller.request_static_assets();
        controller
    }

    fn request_static_assets(&mut self) {
        let cube_material = self.cube_material.clone();
        self.loader.request(
            &self.config.cube_texture_url,
            ResourceKind::Image,
            Box::new(move |scene, resource| {
                if let Resource::Image(texture) = resource {
                    cube_material.set_texture(scene, texture);
                }
            }),
        );

        let wall_material = self.wall_material.clone();
        self.loader.request(
            &self.config.wall_texture_url,
            ResourceKind::Image,
            Box::new(move |scene, resource| {
                if let Resource::Image(texture) = resource {
                    wall_material.set_texture(scene, texture);
                }
            }),
        );

        let wall_material = self.wall_material.clone();
        let scale = self.config.model_scale.map(Vec3::from_array);
        self.loader.request(
            &self.config.model_url,
            ResourceKind::Model,
            Box::new(move |scene, resource| {
                let Resource::Model(mut model) = resource else {
                    return;
                };
                if let Some(scale) = scale {
                    model.transform.scale = scale;
                }
                log::debug!("model {} with {} meshes", model.name, model.mesh_count());
                let id = scene.add(model);
                wall_material.bind(scene, id);
            }),
        );
    }

    /// Schedules the render loop. Returns the handle that cancels it.
    pub fn start(&mut self) -> CancelHandle {
        self.render_loop.start()
    }

    /// Tears the view down: cancels the loop and detaches keyboard tracking.
    pub fn stop(&mut self) {
        self.render_loop.stop();
        if self.keyboard.take().is_some() {
            log::debug!("keyboard tracker detached");
        }
    }

    pub fn state(&self) -> LoopState {
        self.render_loop.state()
    }

    /// One display refresh.
    ///
    /// Applies finished loads, then pointer orbit, matches the surface to
    /// `size` and runs a tick. Returns `None` when the loop is not running.
    pub fn frame(
        &mut self,
        size: SurfaceSize,
        pointer: &PointerState,
        pointer_frame: &PointerFrame,
    ) -> Option<TickReport> {
        self.loader.pump(&mut self.scene);
        self.orbit.update(&mut self.camera, pointer, pointer_frame);

        if self.surface.size() != size {
            log::debug!("surface resized to {}x{}", size.width, size.height);
            self.surface.resize(size);
        }

        let keyboard = self.keyboard.as_ref()?;
        self.render_loop.tick(TickTarget {
            keyboard,
            scene: &mut self.scene,
            controlled: self.cube,
            camera: &mut self.camera,
            surface: self.surface.as_mut(),
        })
    }

    /// Asks `picker` for an image and requests it as the new background.
    ///
    /// Returns immediately; the background changes whenever the load completes.
    pub fn load_background(&mut self, picker: &mut dyn ResourcePicker) -> Option<Ticket> {
        let Some(file_name) = picker.pick_background() else {
            log::debug!("background selection cancelled");
            return None;
        };
        let url = self.config.background_url(&file_name);
        log::info!("loading background {url}");

        let ticket = self.loader.request(
            &url,
            ResourceKind::Image,
            Box::new(|scene, resource| {
                if let Resource::Image(texture) = resource {
                    scene.set_background(Background::Texture(texture));
                }
            }),
        );
        Some(ticket)
    }

    /// Renders now, encodes the result in the current export format and saves it.
    pub fn export_frame(&mut self, sink: &mut dyn ExportSink) -> Result<PathBuf> {
        let size = self.surface.size();
        self.camera.set_aspect_from(size.width, size.height);
        self.surface.draw(&self.scene, &self.camera)?;

        let format = self.export_format;
        let bytes = self.surface.read_pixels(format)?;
        let path = sink.save(format.file_name(), &bytes)?;
        log::info!("exported {} bytes of {format} to {}", bytes.len(), path.display());
        Ok(path)
    }

    pub fn export_format(&self) -> ExportFormat {
        self.export_format
    }

    pub fn set_export_format(&mut self, format: ExportFormat) {
        self.export_format = format;
    }

    pub fn toggle_export_format(&mut self) -> ExportFormat {
        self.export_format = self.export_format.toggled();
        log::info!("export format: {}", self.export_format);
        self.export_format
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn surface(&self) -> &dyn DrawSurface {
        self.surface.as_ref()
    }

    pub fn keyboard(&self) -> Option<&KeyboardTracker> {
        self.keyboard.as_ref()
    }

    /// Transform of the keyboard-controlled cube.
    pub fn cube_transform(&self) -> Transform {
        self.scene
            .node(self.cube)
            .map(|node| node.transform)
            .unwrap_or_default()
    }

    pub fn pending_loads(&self) -> usize {
        self.loader.pending()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::export::MemorySink;
    use crate::picker::QueuePicker;
    use cubeview_engine::assets::Completion;
    use cubeview_engine::input::{InputEvent, KeyCode, Modifiers};
    use cubeview_engine::raster::SoftwareSurface;
    use cubeview_engine::scene::{Color, Texture};
    use cubeview_engine::time::ManualSource;

    /// Holds requests until the test completes them.
    #[derive(Default)]
    struct Inner {
        next: u64,
        requests: Vec<(String, Completion)>,
        ready: Vec<(Completion, Resource)>,
    }

    #[derive(Default, Clone)]
    struct ManualLoader(Rc<RefCell<Inner>>);

    impl ManualLoader {
        fn urls(&self) -> Vec<String> {
            self.0.borrow().requests.iter().map(|(url, _)| url.clone()).collect()
        }

        fn complete(&self, url: &str, resource: Resource) {
            let mut inner = self.0.borrow_mut();
            let pos = inner.requests.iter().position(|(u, _)| u == url).unwrap();
            let (_, on_done) = inner.requests.remove(pos);
            inner.ready.push((on_done, resource));
        }
    }

    impl ResourceLoader for ManualLoader {
        fn request(&mut self, url: &str, _kind: ResourceKind, on_done: Completion) -> Ticket {
            let mut inner = self.0.borrow_mut();
            inner.next += 1;
            inner.requests.push((url.to_owned(), on_done));
            Ticket::new(inner.next)
        }

        fn pump(&mut self, scene: &mut SceneGraph) -> usize {
            let ready = std::mem::take(&mut self.0.borrow_mut().ready);
            let applied = ready.len();
            for (on_done, resource) in ready {
                on_done(scene, resource);
            }
            applied
        }

        fn pending(&self) -> usize {
            let inner = self.0.borrow();
            inner.requests.len() + inner.ready.len()
        }
    }

    struct Rig {
        time: ManualSource,
        hub: InputHub,
        loader: ManualLoader,
        viewport: ViewportController<ManualSource>,
    }

    const SIZE: SurfaceSize = SurfaceSize::new(96, 72);

    impl Rig {
        fn new(config: ViewerConfig) -> Self {
            let time = ManualSource::new();
            let hub = InputHub::new();
            let loader = ManualLoader::default();
            let viewport = ViewportController::new(
                config,
                &hub,
                Box::new(SoftwareSurface::new(SIZE.width, SIZE.height)),
                Box::new(loader.clone()),
                Clock::with_source(time.clone()),
            );
            Self {
                time,
                hub,
                loader,
                viewport,
            }
        }

        /// Camera close enough for the cube to cover a useful share of the frame.
        fn close_up() -> Self {
            let mut config = ViewerConfig::default();
            config.camera.offset_y = 1.0;
            config.camera.offset_z = 3.0;
            Self::new(config)
        }

        fn frame_after(&mut self, secs: f32) -> Option<TickReport> {
            self.time.advance_secs(secs);
            self.viewport
                .frame(SIZE, &PointerState::default(), &PointerFrame::default())
        }

        fn press(&self, code: KeyCode) {
            self.hub.dispatch(&InputEvent::key_down(code, Modifiers::default()));
        }

        fn release(&self, code: KeyCode) {
            self.hub.dispatch(&InputEvent::key_up(code, Modifiers::default()));
        }
    }

    fn checker() -> Texture {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([220, 30, 30, 255]));
        img.put_pixel(1, 0, Rgba([30, 30, 220, 255]));
        img.put_pixel(0, 1, Rgba([30, 200, 30, 255]));
        Texture::new(img)
    }

    fn decode(bytes: &[u8]) -> image::RgbaImage {
        image::load_from_memory(bytes).unwrap().to_rgba8()
    }

    #[test]
    fn builds_reference_scene() {
        let rig = Rig::new(ViewerConfig::default());
        let v = &rig.viewport;

        assert_eq!(v.scene().len(), 3);
        assert_eq!(v.cube_transform().position, Vec3::new(0.0, 1.0, 0.0));
        assert!(v.scene().find("wall-1").is_some());
        assert!(matches!(v.scene().background(), Background::Color(c) if *c == Color::WHITE));

        assert!((v.camera().position - Vec3::new(0.0, 3.0, 10.0)).length() < 1e-4);
        assert_eq!(v.camera().target, Vec3::ZERO);
        assert_eq!(v.camera().fov_deg, 90.0);
        assert!((v.camera().aspect - 96.0 / 72.0).abs() < 1e-6);

        assert_eq!(
            rig.loader.urls(),
            vec!["/assets/texture.jpg", "/assets/crate.gif", "./assets/stair.gltf"]
        );
        assert_eq!(v.state(), LoopState::Idle);
    }

    #[test]
    fn pending_loads_do_not_block_the_loop() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.viewport.start();
        rig.frame_after(0.0);

        rig.press(KeyCode::RIGHT);
        let report = rig.frame_after(0.25).unwrap();
        assert!(report.drawn);
        rig.release(KeyCode::RIGHT);
        rig.press(KeyCode::letter(b'E'));
        rig.frame_after(0.5);

        let t = rig.viewport.cube_transform();
        assert!((t.position.x - 5.0).abs() < 1e-4);
        assert!((t.rotation.z - FRAC_PI_2 * 0.5).abs() < 1e-5);
        assert_eq!(rig.viewport.pending_loads(), 3);
    }

    #[test]
    fn completed_textures_reach_their_meshes() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.viewport.start();
        let texture = checker();
        rig.loader.complete("/assets/texture.jpg", Resource::Image(texture.clone()));
        rig.frame_after(0.016);

        let cube = rig.viewport.scene().find("cube").unwrap();
        let mesh = rig.viewport.scene().node(cube).and_then(|n| n.mesh.as_ref()).unwrap();
        assert!(mesh.material.texture.as_ref().unwrap().ptr_eq(&texture));
        let wall = rig.viewport.scene().find("wall-0").unwrap();
        let mesh = rig.viewport.scene().node(wall).and_then(|n| n.mesh.as_ref()).unwrap();
        assert!(mesh.material.texture.is_none());
    }

    #[test]
    fn model_shares_wall_material_and_scale() {
        let mut config = ViewerConfig::default();
        config.model_scale = Some([2.0, 0.5, 2.0]);
        let mut rig = Rig::new(config);
        rig.viewport.start();

        let step = Node::mesh("step", Arc::new(Geometry::cuboid(1.0, 0.2, 1.0)), Material::default());
        rig.loader
            .complete("./assets/stair.gltf", Resource::Model(Node::group("stair").with_child(step)));
        rig.frame_after(0.016);

        let wall_texture = checker();
        rig.loader.complete("/assets/crate.gif", Resource::Image(wall_texture.clone()));
        rig.frame_after(0.016);

        let scene = rig.viewport.scene();
        let stair = scene.find("stair").unwrap();
        assert_eq!(scene.node(stair).unwrap().transform.scale, Vec3::new(2.0, 0.5, 2.0));
        let step = &scene.node(stair).unwrap().children[0];
        let texture = step.mesh.as_ref().unwrap().material.texture.as_ref().unwrap();
        assert!(texture.ptr_eq(&wall_texture));
    }

    #[test]
    fn load_background_uses_picked_name() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.viewport.start();
        let mut picker = QueuePicker {
            answers: VecDeque::from([None, Some("sky.png".to_string())]),
        };

        assert!(rig.viewport.load_background(&mut picker).is_none());
        assert!(rig.viewport.load_background(&mut picker).is_some());
        assert_eq!(rig.loader.urls().last().unwrap(), "/assets/sky.png");

        // Not applied until the completion is pumped at a frame boundary.
        rig.loader.complete("/assets/sky.png", Resource::Image(checker()));
        assert!(matches!(rig.viewport.scene().background(), Background::Color(_)));
        rig.frame_after(0.016);
        assert!(matches!(rig.viewport.scene().background(), Background::Texture(_)));
    }

    #[test]
    fn export_renders_before_readback() {
        let mut rig = Rig::new(ViewerConfig::default());
        let mut sink = MemorySink::default();

        // No frame has run yet.
        rig.viewport.export_frame(&mut sink).unwrap();
        let (name, bytes) = &sink.saved[0];
        assert_eq!(name, "export.png");
        let img = decode(bytes);
        assert_eq!(img.dimensions(), (SIZE.width, SIZE.height));
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn export_reflects_current_rotation() {
        let mut rig = Rig::close_up();
        rig.viewport.start();
        rig.loader.complete("/assets/texture.jpg", Resource::Image(checker()));
        rig.frame_after(0.0);

        let mut sink = MemorySink::default();
        rig.viewport.export_frame(&mut sink).unwrap();

        rig.press(KeyCode::letter(b'Q'));
        rig.frame_after(0.5);
        rig.release(KeyCode::letter(b'Q'));
        rig.viewport.export_frame(&mut sink).unwrap();

        let before = decode(&sink.saved[0].1);
        let after = decode(&sink.saved[1].1);
        assert_ne!(before.as_raw(), after.as_raw());
    }

    #[test]
    fn toggled_format_changes_file_and_encoding() {
        let mut rig = Rig::new(ViewerConfig::default());
        let mut sink = MemorySink::default();
        assert_eq!(rig.viewport.toggle_export_format(), ExportFormat::Jpeg);

        rig.viewport.export_frame(&mut sink).unwrap();
        let (name, bytes) = &sink.saved[0];
        assert_eq!(name, "export.jpg");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        rig.viewport.set_export_format(ExportFormat::Png);
        assert_eq!(rig.viewport.export_format(), ExportFormat::Png);
    }

    #[test]
    fn frame_follows_surface_size() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.viewport.start();
        rig.time.advance_secs(0.016);
        let size = SurfaceSize::new(40, 20);
        rig.viewport
            .frame(size, &PointerState::default(), &PointerFrame::default());
        assert_eq!(rig.viewport.surface().size(), size);
        assert!((rig.viewport.camera().aspect - 2.0).abs() < 1e-6);
    }

    #[test]
    fn stop_detaches_keyboard() {
        let mut rig = Rig::new(ViewerConfig::default());
        rig.viewport.start();
        assert_eq!(rig.hub.listener_count(), 1);

        rig.viewport.stop();
        assert_eq!(rig.hub.listener_count(), 0);
        assert!(rig.viewport.keyboard().is_none());
        assert_eq!(rig.viewport.state(), LoopState::Stopped);
        assert!(rig.frame_after(0.016).is_none());
    }
}
