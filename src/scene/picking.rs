//! Hover picking via ray-sphere intersection.
//!
//! Planets are tested analytically as spheres; the pointer ray starts at the
//! camera position and passes through the unprojected pointer.

use nalgebra::{Point3, Vector2, Vector3, Vector4};

use crate::scene::camera::PerspectiveCamera;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Ray { origin, direction: direction.normalize() }
    }

    /// Ray from the camera through a pointer in normalized device coordinates.
    /// `None` only when the view-projection matrix is singular.
    pub fn from_camera(ndc: Vector2<f32>, camera: &PerspectiveCamera) -> Option<Self> {
        let inverse = camera.view_projection().try_inverse()?;
        let unprojected = inverse * Vector4::new(ndc.x, ndc.y, 0.5, 1.0);
        if unprojected.w.abs() < f32::EPSILON {
            return None;
        }
        let point = Point3::from(unprojected.xyz() / unprojected.w);
        Some(Ray::new(camera.position, point - camera.position))
    }

    pub fn at(&self, distance: f32) -> Point3<f32> {
        self.origin + self.direction * distance
    }
}

/// Distance along the ray to where it enters the sphere.
/// Only the outside of the surface is hit: spheres are drawn with back faces
/// culled, so an origin inside the sphere sees nothing and gets `None`.
pub fn ray_sphere_intersect(ray: &Ray, center: Point3<f32>, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let a = ray.direction.dot(&ray.direction);
    let b = 2.0 * oc.dot(&ray.direction);
    let c = oc.dot(&oc) - radius * radius;
    if c <= 0.0 {
        return None;
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    if t > 0.0 {
        Some(t)
    } else {
        None
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pickable {
    pub name: String,
    pub center: Point3<f32>,
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Intersection {
    pub name: String,
    pub distance: f32,
    pub point: Point3<f32>,
}

/// All hits sorted nearest first.
pub fn intersect_objects(ray: &Ray, objects: &[Pickable]) -> Vec<Intersection> {
    let mut hits: Vec<Intersection> = objects
        .iter()
        .filter_map(|object| {
            ray_sphere_intersect(ray, object.center, object.radius).map(|distance| Intersection {
                name: object.name.clone(),
                distance,
                point: ray.at(distance),
            })
        })
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorStyle {
    Default,
    Pointer,
}

impl CursorStyle {
    pub fn as_css(&self) -> &'static str {
        match self {
            CursorStyle::Default => "default",
            CursorStyle::Pointer => "pointer",
        }
    }
}

#[derive(Debug, Default)]
pub struct HoverState {
    current: Option<Intersection>,
}

impl HoverState {
    pub fn current(&self) -> Option<&Intersection> {
        self.current.as_ref()
    }

    /// Stores the nearest hit of this frame. Returns the new cursor only on
    /// the frame hovering starts or stops.
    pub fn update(&mut self, hits: Vec<Intersection>) -> Option<CursorStyle> {
        let was_hovering = self.current.is_some();
        self.current = hits.into_iter().next();

        match (was_hovering, self.current.is_some()) {
            (false, true) => Some(CursorStyle::Pointer),
            (true, false) => Some(CursorStyle::Default),
            _ => None,
        }
    }
}
