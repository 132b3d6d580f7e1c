//! Damped orbit controls.
//!
//! Drag and wheel input only accumulates deltas. `update` is called once per
//! frame and moves the camera by a damped fraction of whatever is pending, so
//! the camera keeps gliding for a while after the mouse stops.

use std::f32::consts::PI;

use nalgebra::{Point3, Vector2, Vector3};

use crate::scene::camera::PerspectiveCamera;

const EPS: f32 = 1e-6;
/// Smallest orbit radius. Zero would put the camera on the target for good.
const MIN_RADIUS: f32 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
}

impl DragMode {
    /// Maps `MouseEvent.button` to a drag mode: primary rotates, middle and secondary pan.
    pub fn from_button(button: i16) -> Option<Self> {
        match button {
            0 => Some(DragMode::Rotate),
            1 | 2 => Some(DragMode::Pan),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    /// `None` when the offset is too short to carry a direction.
    fn from_offset(offset: &Vector3<f32>) -> Option<Self> {
        let radius = offset.norm();
        if radius < EPS {
            return None;
        }
        Some(Spherical {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        })
    }

    fn to_offset(self) -> Vector3<f32> {
        let sin_phi = self.phi.sin();
        Vector3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vector3<f32>,
    drag: Option<(DragMode, Vector2<f32>)>,
    // Last applied position; stands in when the camera sits too close to the target.
    spherical: Spherical,
}

impl OrbitControls {
    pub fn new(target: Point3<f32>, damping_factor: f32) -> Self {
        OrbitControls {
            target,
            enable_damping: true,
            damping_factor,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vector3::zeros(),
            drag: None,
            spherical: Spherical { radius: 1.0, theta: 0.0, phi: PI / 2.0 },
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn begin_drag(&mut self, button: i16, x: f32, y: f32) {
        self.drag = DragMode::from_button(button).map(|mode| (mode, Vector2::new(x, y)));
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Feeds a pointer position while a button is held. `viewport_height` is in CSS pixels.
    pub fn drag_to(&mut self, x: f32, y: f32, viewport_height: f32, camera: &PerspectiveCamera) {
        let Some((mode, last)) = self.drag else {
            return;
        };
        let current = Vector2::new(x, y);
        let delta = current - last;
        self.drag = Some((mode, current));

        let height = viewport_height.max(1.0);
        match mode {
            DragMode::Rotate => {
                let delta = delta * self.rotate_speed;
                self.rotate_left(2.0 * PI * delta.x / height);
                self.rotate_up(2.0 * PI * delta.y / height);
            }
            DragMode::Pan => {
                let delta = delta * self.pan_speed;
                let target_distance =
                    (camera.position - self.target).norm() * (camera.fov_rad() / 2.0).tan();
                let (right, up) = camera.basis();
                self.pan_offset -= right * (2.0 * delta.x * target_distance / height);
                self.pan_offset += up * (2.0 * delta.y * target_distance / height);
            }
        }
    }

    /// Negative `delta_y` (wheel up) moves the camera toward the target.
    pub fn wheel(&mut self, delta_y: f32) {
        let zoom = 0.95_f32.powf(self.zoom_speed);
        if delta_y < 0.0 {
            self.scale *= zoom;
        } else if delta_y > 0.0 {
            self.scale /= zoom;
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Advances the controls by one frame. Returns true when the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(&offset).unwrap_or(self.spherical);

        let step = if self.enable_damping { self.damping_factor } else { 1.0 };
        spherical.theta += self.delta_theta * step;
        spherical.phi += self.delta_phi * step;
        spherical.phi = spherical.phi.clamp(EPS, PI - EPS);
        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.min_distance.max(MIN_RADIUS), self.max_distance.max(MIN_RADIUS));
        self.target += self.pan_offset * step;
        self.spherical = spherical;

        let previous = camera.position;
        camera.position = self.target + spherical.to_offset();
        camera.target = self.target;

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.delta_theta *= decay;
            self.delta_phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vector3::zeros();
        }
        self.scale = 1.0;

        (camera.position - previous).norm_squared() > EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;

    fn camera_at(position: [f32; 3]) -> PerspectiveCamera {
        let config = CameraConfig { position, ..CameraConfig::default() };
        PerspectiveCamera::new(&config, 1.0)
    }

    #[test]
    fn idle_update_keeps_camera_still() {
        let mut camera = camera_at([0.0, 6.0, 10.0]);
        let mut controls = OrbitControls::new(Point3::origin(), 0.05);
        assert!(!controls.update(&mut camera));
        assert!((camera.position - Point3::new(0.0, 6.0, 10.0)).norm() < 1e-4);
    }

    #[test]
    fn rotation_is_damped_and_converges() {
        let mut camera = camera_at([0.0, 0.0, 10.0]);
        let mut controls = OrbitControls::new(Point3::origin(), 0.05);

        // A drag of height/8 pixels is a quarter turn of pi.
        controls.begin_drag(0, 0.0, 0.0);
        controls.drag_to(100.0, 0.0, 800.0, &camera);
        controls.end_drag();

        assert!(controls.update(&mut camera));
        let first_theta = camera.position.x.atan2(camera.position.z);
        assert!((first_theta + PI / 4.0 * 0.05).abs() < 1e-4);

        for _ in 0..500 {
            controls.update(&mut camera);
        }
        let theta = camera.position.x.atan2(camera.position.z);
        assert!((theta + PI / 4.0).abs() < 1e-3, "theta = {}", theta);
        assert!(((camera.position - Point3::origin()).norm() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn wheel_up_moves_closer() {
        let mut camera = camera_at([0.0, 0.0, 10.0]);
        let mut controls = OrbitControls::new(Point3::origin(), 0.05);
        controls.wheel(-100.0);
        controls.update(&mut camera);
        assert!((camera.position.z - 9.5).abs() < 1e-4);

        controls.wheel(100.0);
        controls.update(&mut camera);
        assert!((camera.position.z - 10.0).abs() < 1e-3);
    }

    #[test]
    fn zooming_all_the_way_in_can_be_undone() {
        let mut camera = camera_at([0.0, 0.0, 10.0]);
        let mut controls = OrbitControls::new(Point3::origin(), 0.05);
        for _ in 0..400 {
            controls.wheel(-1.0);
            controls.update(&mut camera);
        }
        let closest = (camera.position - controls.target).norm();
        assert!(closest < 1e-6, "closest = {}", closest);

        for _ in 0..400 {
            controls.wheel(1.0);
            controls.update(&mut camera);
        }
        let distance = (camera.position - controls.target).norm();
        assert!((distance - 10.0).abs() < 1e-2, "distance = {}", distance);
        assert!((camera.position - Point3::new(0.0, 0.0, 10.0)).norm() < 1e-2);
        assert!(camera.view_matrix().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn radius_never_reaches_zero() {
        let mut camera = camera_at([0.0, 0.0, 10.0]);
        let mut controls = OrbitControls::new(Point3::origin(), 0.05);
        for _ in 0..5000 {
            controls.wheel(-1.0);
            controls.update(&mut camera);
        }
        assert!(controls.spherical.radius >= MIN_RADIUS);
        for _ in 0..50 {
            controls.wheel(1.0);
            controls.update(&mut camera);
        }
        assert!(controls.spherical.radius > MIN_RADIUS);
    }

    #[test]
    fn polar_angle_never_flips_over_the_pole() {
        let mut camera = camera_at([0.0, 0.0, 10.0]);
        let mut controls = OrbitControls::new(Point3::origin(), 0.05);
        controls.begin_drag(0, 0.0, 0.0);
        controls.drag_to(0.0, 5000.0, 800.0, &camera);
        for _ in 0..500 {
            controls.update(&mut camera);
        }
        assert!(camera.position.y > 9.9);
        assert!(camera.position.z.is_finite());
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut camera = camera_at([0.0, 0.0, 10.0]);
        let mut controls = OrbitControls::new(Point3::origin(), 0.05);
        controls.begin_drag(2, 0.0, 0.0);
        controls.drag_to(50.0, 0.0, 800.0, &camera);
        controls.end_drag();
        for _ in 0..500 {
            controls.update(&mut camera);
        }
        assert!(controls.target.x < 0.0);
        assert!((camera.position.x - controls.target.x).abs() < 1e-3);
        assert!(((camera.position - controls.target).norm() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn moves_without_a_held_button_are_ignored() {
        let mut camera = camera_at([0.0, 0.0, 10.0]);
        let mut controls = OrbitControls::new(Point3::origin(), 0.05);
        controls.drag_to(300.0, 300.0, 800.0, &camera);
        assert!(!controls.update(&mut camera));

        controls.begin_drag(7, 0.0, 0.0);
        assert!(!controls.is_dragging());
    }

    #[test]
    fn undamped_update_applies_everything_at_once() {
        let mut camera = camera_at([0.0, 0.0, 10.0]);
        let mut controls = OrbitControls::new(Point3::origin(), 0.05);
        controls.enable_damping = false;
        controls.rotate_left(PI / 2.0);
        controls.update(&mut camera);
        assert!((camera.position.x + 10.0).abs() < 1e-3);
        assert!(!controls.update(&mut camera));
    }
}
