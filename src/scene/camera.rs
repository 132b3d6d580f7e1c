use nalgebra::{Matrix4, Point3, Vector3};

use crate::config::CameraConfig;

#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let [x, y, z] = config.position;
        let mut camera = PerspectiveCamera {
            position: Point3::new(x, y, z),
            target: Point3::origin(),
            up: Vector3::y(),
            fov_deg: config.fov_deg,
            aspect,
            near: config.near,
            far: config.far,
            projection: Matrix4::identity(),
        };
        camera.update_projection();
        camera
    }

    pub fn fov_rad(&self) -> f32 {
        self.fov_deg.to_radians()
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection();
    }

    fn update_projection(&mut self) {
        self.projection = Matrix4::new_perspective(self.aspect, self.fov_rad(), self.near, self.far);
    }

    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    /// Unit vector from the camera toward its target.
    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.position).normalize()
    }

    /// Camera-space right and up axes in world coordinates.
    pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>) {
        let forward = self.forward();
        let right = forward.cross(&self.up).normalize();
        let up = right.cross(&forward);
        (right, up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_vantage_point() {
        let camera = PerspectiveCamera::new(&CameraConfig::default(), 1.5);
        assert_eq!(camera.position, Point3::new(0.0, 6.0, 10.0));
        assert_eq!(camera.fov_deg, 70.0);
        assert_eq!(camera.near, 0.1);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = PerspectiveCamera::new(&CameraConfig::default(), 1.5);
        let clip = camera.view_projection() * Point3::origin().to_homogeneous();
        assert!((clip.x / clip.w).abs() < 1e-5);
        assert!((clip.y / clip.w).abs() < 1e-5);
    }

    #[test]
    fn aspect_change_updates_projection() {
        let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        let before = *camera.projection_matrix();
        camera.set_aspect(2.0);
        assert_ne!(before, *camera.projection_matrix());
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn basis_is_orthonormal() {
        let camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        let (right, up) = camera.basis();
        assert!((right.norm() - 1.0).abs() < 1e-5);
        assert!((up.norm() - 1.0).abs() < 1e-5);
        assert!(right.dot(&up).abs() < 1e-5);
        assert!(right.dot(&camera.forward()).abs() < 1e-5);
    }
}
