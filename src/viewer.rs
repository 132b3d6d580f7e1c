use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::{Matrix4, Vector3};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlCanvasElement, WebGlTexture};

use crate::config::SceneConfig;
use crate::engine::mesh::Mesh;
use crate::engine::overlay::LabelOverlay;
use crate::engine::renderer::{GpuMesh, GpuPoints, MeshMaterial, PointsMaterial, Renderer};
use crate::engine::texture::{load_texture, AssetTracker, SharedTracker};
use crate::scene::label::project_to_screen;
use crate::scene::viewport::Viewport;
use crate::scene::SceneState;

const PLANET_SEGMENTS: u16 = 32;
const BACKDROP_SEGMENTS: u16 = 64;
const MARKER_RADIUS: f32 = 0.04;

struct PlanetModel {
    mesh: GpuMesh,
    texture: WebGlTexture,
    bump_map: WebGlTexture,
    model: Matrix4<f32>,
}

/// The running scene: GPU resources plus the state they are drawn from.
pub struct Viewer {
    renderer: Renderer,
    state: SceneState,
    planets: Vec<PlanetModel>,
    backdrop: GpuMesh,
    galaxy: WebGlTexture,
    marker: GpuMesh,
    particles: GpuPoints,
    particle_map: WebGlTexture,
    overlay: LabelOverlay,
    tracker: SharedTracker,
    document: Document,
    canvas: HtmlCanvasElement,
}

impl Viewer {
    pub fn new(
        mut renderer: Renderer,
        canvas: HtmlCanvasElement,
        document: Document,
        config: SceneConfig,
        viewport: Viewport,
    ) -> Result<Self, JsValue> {
        let tracker: SharedTracker = Rc::new(RefCell::new(AssetTracker::default()));
        let mut rng = SmallRng::from_entropy();
        let state = SceneState::new(config, viewport, &mut rng);
        let config = &state.config;

        let mut planets = Vec::with_capacity(config.planets.len());
        for planet in &config.planets {
            let mesh = renderer.upload_mesh(&Mesh::sphere(planet.radius, PLANET_SEGMENTS, PLANET_SEGMENTS))?;
            let bump_map = load_texture(&renderer.gl, &planet.bump_map, &tracker)?;
            let texture = load_texture(&renderer.gl, &planet.texture, &tracker)?;
            planets.push(PlanetModel {
                mesh,
                texture,
                bump_map,
                model: Matrix4::new_translation(&Vector3::new(planet.x, 0.0, 0.0)),
            });
            log::debug!("planet {} (key {}) ready", planet.name, planet.key);
        }

        let backdrop_mesh = Mesh::sphere(config.backdrop_radius, BACKDROP_SEGMENTS, BACKDROP_SEGMENTS).inverted();
        let backdrop = renderer.upload_mesh(&backdrop_mesh)?;
        log::debug!("backdrop sphere: {} vertices", backdrop_mesh.vertex_count());
        let galaxy = load_texture(&renderer.gl, &config.galaxy_texture, &tracker)?;

        let marker = renderer.upload_mesh(&Mesh::sphere(MARKER_RADIUS, 16, 8))?;

        let particles = renderer.upload_points(state.particles.positions(), state.particles.colors())?;
        log::debug!("particle cloud: {} points, shown: {}", state.particles.len(), config.show_particles);
        let particle_map = load_texture(&renderer.gl, &config.particle_texture, &tracker)?;

        renderer.set_ambient(config.ambient_intensity);
        renderer.enable_depth_test();
        let (width, height) = state.viewport.drawing_buffer_size();
        renderer.set_size(width, height);

        let overlay = LabelOverlay::new(&document, state.viewport.width, state.viewport.height)?;

        let viewer = Viewer {
            renderer,
            state,
            planets,
            backdrop,
            galaxy,
            marker,
            particles,
            particle_map,
            overlay,
            tracker,
            document,
            canvas,
        };
        viewer.apply_canvas_size()?;
        Ok(viewer)
    }

    fn apply_canvas_size(&self) -> Result<(), JsValue> {
        let style = self.canvas.style();
        style.set_property("width", &format!("{}px", self.state.viewport.width))?;
        style.set_property("height", &format!("{}px", self.state.viewport.height))?;
        Ok(())
    }

    pub fn on_resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) -> Result<(), JsValue> {
        let (buffer_width, buffer_height) = self.state.on_resize(width, height, device_pixel_ratio);
        self.renderer.set_size(buffer_width, buffer_height);
        self.apply_canvas_size()?;
        self.overlay.set_size(self.state.viewport.width, self.state.viewport.height)
    }

    pub fn on_pointer_move(&mut self, client_x: f32, client_y: f32) {
        self.state.on_pointer_move(client_x, client_y);
    }

    pub fn on_pointer_down(&mut self, button: i16, client_x: f32, client_y: f32) {
        self.state.on_pointer_down(button, client_x, client_y);
    }

    pub fn on_pointer_up(&mut self) {
        self.state.on_pointer_up();
    }

    pub fn on_wheel(&mut self, delta_y: f32) {
        self.state.on_wheel(delta_y);
    }

    /// One animation frame.
    pub fn tick(&mut self) -> Result<(), JsValue> {
        let assets_ready = self.tracker.borrow().is_ready();
        let update = self.state.advance(assets_ready);

        if let Some(cursor) = update.cursor {
            self.canvas.style().set_property("cursor", cursor.as_css())?;
            log::debug!("hovering {:?}", self.state.hover.current().map(|hit| &hit.name));
        }
        if update.label_attached {
            let config = &self.state.config;
            self.overlay.attach(&self.document, &config.label_text, &config.label_class)?;
            log::info!("label attached at {:?}", self.state.label.position);
        }

        self.render()
    }

    fn render(&mut self) -> Result<(), JsValue> {
        let camera = &self.state.camera;
        let view = camera.view_matrix();
        let projection = *camera.projection_matrix();
        let view_proj = projection * view;

        let placement = project_to_screen(&self.state.label.position, &view_proj, &self.state.viewport);
        self.overlay.render(&placement)?;

        self.renderer.clear(0.0, 0.0, 0.0);

        for planet in &self.planets {
            let material = MeshMaterial {
                color_map: Some(&planet.texture),
                bump_map: Some(&planet.bump_map),
                color: [1.0, 1.0, 1.0],
                opacity: 1.0,
                lit: true,
            };
            self.renderer.draw_mesh(&planet.mesh, &material, &planet.model, &view_proj);
        }

        if self.state.config.show_anchor_marker {
            let material = MeshMaterial {
                color_map: None,
                bump_map: None,
                color: [1.0, 0.0, 0.0],
                opacity: 1.0,
                lit: true,
            };
            let model = Matrix4::new_translation(&self.state.label.position.coords);
            self.renderer.draw_mesh(&self.marker, &material, &model, &view_proj);
        }

        let rotation = self.state.backdrop_rotation;
        let backdrop_model = Matrix4::new_rotation(Vector3::x() * rotation.x)
            * Matrix4::new_rotation(Vector3::y() * rotation.y)
            * Matrix4::new_rotation(Vector3::z() * rotation.z);
        let material = MeshMaterial {
            color_map: Some(&self.galaxy),
            bump_map: None,
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            lit: false,
        };
        self.renderer.draw_mesh(&self.backdrop, &material, &backdrop_model, &view_proj);

        if self.state.config.show_particles && !self.state.particles.is_empty() {
            if self.state.particles.take_dirty() {
                self.renderer.update_points(&self.particles, self.state.particles.positions());
            }
            let model = Matrix4::new_translation(&Vector3::new(self.state.config.particle_offset_x, 0.0, 0.0));
            let material = PointsMaterial {
                alpha_map: &self.particle_map,
                size: self.state.config.particle_size,
            };
            self.renderer.draw_points(&self.particles, &material, &model, &view, &projection);
        }

        Ok(())
    }

    /// Removes everything this viewer added to the page.
    pub fn dispose(self) {
        self.overlay.remove();
        self.canvas.style().set_property("cursor", "default").ok();
        log::info!(
            "scene disposed after {} frames ({} failed assets, label {:?})",
            self.state.frame,
            self.tracker.borrow().failed(),
            self.state.label.state()
        );
    }
}
