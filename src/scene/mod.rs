//! Host-independent scene state.
//!
//! `SceneState` owns everything the frame loop and the input handlers touch.
//! The wasm entry point holds exactly one and passes DOM input into it; the
//! renderer only reads from it.

pub mod camera;
pub mod controls;
pub mod geo;
pub mod label;
pub mod particles;
pub mod picking;
pub mod viewport;

use std::f32::consts::TAU;

use nalgebra::{Point3, Vector2, Vector3};
use rand::Rng;

use crate::config::SceneConfig;
use camera::PerspectiveCamera;
use controls::OrbitControls;
use label::LabelAnchor;
use particles::ParticleCloud;
use picking::{intersect_objects, CursorStyle, HoverState, Pickable, Ray};
use viewport::Viewport;

/// What a single tick changed that the host has to apply.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameUpdate {
    pub cursor: Option<CursorStyle>,
    pub label_attached: bool,
}

pub struct SceneState {
    pub config: SceneConfig,
    pub viewport: Viewport,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub pointer: Vector2<f32>,
    pub hover: HoverState,
    pub pickables: Vec<Pickable>,
    pub particles: ParticleCloud,
    pub backdrop_rotation: Vector3<f32>,
    pub label: LabelAnchor,
    pub frame: u64,
}

impl SceneState {
    pub fn new<R: Rng>(config: SceneConfig, viewport: Viewport, rng: &mut R) -> Self {
        let camera = PerspectiveCamera::new(&config.camera, viewport.aspect());
        let controls = OrbitControls::new(Point3::origin(), config.damping_factor);

        let pickables = config
            .planets
            .iter()
            .map(|planet| Pickable {
                name: planet.name.clone(),
                center: Point3::new(planet.x, 0.0, 0.0),
                radius: planet.radius,
            })
            .collect();

        let particles = ParticleCloud::generate(config.particle_count, config.particle_extent, rng);
        let anchor = geo::lat_lon_to_unit(config.anchor.lat, config.anchor.lon) * config.anchor_radius;

        SceneState {
            viewport,
            camera,
            controls,
            pointer: Vector2::zeros(),
            hover: HoverState::default(),
            pickables,
            particles,
            backdrop_rotation: Vector3::zeros(),
            label: LabelAnchor::new(Point3::from(anchor)),
            frame: 0,
            config,
        }
    }

    /// Returns the new drawing buffer size. Calling it again with the same
    /// arguments changes nothing.
    pub fn on_resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) -> (u32, u32) {
        self.viewport.resize(width, height, device_pixel_ratio);
        self.camera.set_aspect(self.viewport.aspect());
        self.viewport.drawing_buffer_size()
    }

    /// Overwrites the hover pointer and feeds an active orbit drag.
    pub fn on_pointer_move(&mut self, client_x: f32, client_y: f32) {
        self.pointer = self.viewport.normalize_pointer(client_x, client_y);
        if self.controls.is_dragging() {
            self.controls.drag_to(client_x, client_y, self.viewport.height, &self.camera);
        }
    }

    pub fn on_pointer_down(&mut self, button: i16, client_x: f32, client_y: f32) {
        self.controls.begin_drag(button, client_x, client_y);
    }

    pub fn on_pointer_up(&mut self) {
        self.controls.end_drag();
    }

    pub fn on_wheel(&mut self, delta_y: f32) {
        self.controls.wheel(delta_y);
    }

    /// Runs the state half of one frame: orbit damping, hover picking,
    /// particle upload flag, backdrop spin and deferred label attachment.
    pub fn advance(&mut self, assets_ready: bool) -> FrameUpdate {
        self.controls.update(&mut self.camera);

        let hits = match Ray::from_camera(self.pointer, &self.camera) {
            Some(ray) => intersect_objects(&ray, &self.pickables),
            None => Vec::new(),
        };
        let cursor = self.hover.update(hits);

        self.particles.mark_dirty();

        let spin = self.config.backdrop_spin;
        self.backdrop_rotation = self.backdrop_rotation.map(|angle| (angle + spin).rem_euclid(TAU));

        let label_attached = self.label.try_attach(assets_ready);
        self.frame += 1;

        FrameUpdate { cursor, label_attached }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::label::LabelState;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn small_config() -> SceneConfig {
        SceneConfig { particle_count: 16, ..SceneConfig::default() }
    }

    fn state() -> SceneState {
        let mut rng = SmallRng::seed_from_u64(3);
        SceneState::new(small_config(), Viewport::new(800.0, 600.0, 1.0), &mut rng)
    }

    #[test]
    fn builds_one_pickable_per_planet() {
        let state = state();
        assert_eq!(state.pickables.len(), 1);
        assert_eq!(state.pickables[0].name, "earth");
        assert_eq!(state.pickables[0].radius, 3.0);
        assert_eq!(state.particles.len(), 16);
        assert!((state.camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn resize_is_idempotent() {
        let mut once = state();
        let mut twice = state();
        let size_once = once.on_resize(1280.0, 720.0, 3.0);
        twice.on_resize(1280.0, 720.0, 3.0);
        let size_twice = twice.on_resize(1280.0, 720.0, 3.0);
        assert_eq!(size_once, size_twice);
        assert_eq!(size_once, (2560, 1440));
        assert_eq!(once.camera.aspect, twice.camera.aspect);
        assert_eq!(once.camera.projection_matrix(), twice.camera.projection_matrix());
    }

    #[test]
    fn pointer_moves_are_last_write_wins() {
        let mut state = state();
        state.on_pointer_move(0.0, 0.0);
        state.on_pointer_move(400.0, 300.0);
        assert_eq!(state.pointer, Vector2::new(0.0, 0.0));
    }

    #[test]
    fn drag_orbits_the_camera_on_later_frames() {
        let mut state = state();
        let start = state.camera.position;
        state.on_pointer_down(0, 400.0, 300.0);
        state.on_pointer_move(500.0, 300.0);
        state.on_pointer_up();
        assert_eq!(state.camera.position, start);

        state.advance(false);
        let moved = state.camera.position;
        assert_ne!(moved, start);
        state.advance(false);
        assert_ne!(state.camera.position, moved);
    }

    #[test]
    fn wheel_zooms_on_next_frame() {
        let mut state = state();
        let before = (state.camera.position - state.controls.target).norm();
        state.on_wheel(-1.0);
        state.advance(false);
        let after = (state.camera.position - state.controls.target).norm();
        assert!(after < before);
    }

    #[test]
    fn hover_edges_follow_the_pointer() {
        let mut state = state();
        state.on_pointer_move(0.0, 0.0);
        assert_eq!(state.advance(false).cursor, None);
        assert!(state.hover.current().is_none());

        state.on_pointer_move(400.0, 300.0);
        assert_eq!(state.advance(false).cursor, Some(CursorStyle::Pointer));
        assert_eq!(state.advance(false).cursor, None);
        assert_eq!(state.hover.current().unwrap().name, "earth");

        state.on_pointer_move(0.0, 0.0);
        assert_eq!(state.advance(false).cursor, Some(CursorStyle::Default));
        assert!(state.hover.current().is_none());
    }

    #[test]
    fn no_hover_from_inside_a_planet() {
        let mut state = state();
        state.on_pointer_move(400.0, 300.0);
        assert_eq!(state.advance(false).cursor, Some(CursorStyle::Pointer));

        for _ in 0..30 {
            state.on_wheel(-1.0);
            state.advance(false);
        }
        let distance = (state.camera.position - state.controls.target).norm();
        assert!(distance < 3.0, "distance = {}", distance);
        assert!(state.hover.current().is_none());
        assert_eq!(state.advance(false).cursor, None);
    }

    #[test]
    fn backdrop_spin_counts_frames_not_time() {
        let mut state = state();
        for _ in 0..1000 {
            state.advance(false);
        }
        assert_eq!(state.frame, 1000);
        for angle in state.backdrop_rotation.iter() {
            assert!((angle - 1000.0 * 0.0001).abs() < 1e-5, "angle = {}", angle);
        }
    }

    #[test]
    fn backdrop_spin_wraps_at_full_turn() {
        let mut state = state();
        state.config.backdrop_spin = 1.0;
        for _ in 0..7 {
            state.advance(false);
        }
        for angle in state.backdrop_rotation.iter() {
            assert!((angle - (7.0 - TAU)).abs() < 1e-4);
        }
    }

    #[test]
    fn label_waits_for_assets() {
        let mut state = state();
        assert!(!state.advance(false).label_attached);
        assert_eq!(state.label.state(), LabelState::Pending);
        assert!(state.advance(true).label_attached);
        assert!(!state.advance(true).label_attached);
        assert_eq!(state.label.state(), LabelState::Attached);
    }

    #[test]
    fn label_sits_on_the_anchor() {
        let state = state();
        let expected = geo::lat_lon_to_unit(28.6139, 77.2090);
        assert!((state.label.position.coords - expected).norm() < 1e-6);
    }

    #[test]
    fn particles_are_flagged_every_frame() {
        let mut state = state();
        state.particles.take_dirty();
        state.advance(false);
        assert!(state.particles.take_dirty());
    }
}
