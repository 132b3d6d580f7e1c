use std::f32::consts::PI;

/// Floats per vertex: position (3), uv (2).
pub const VERTEX_STRIDE: usize = 5;

pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// UV sphere. `u` runs around the equator, `v` from the north pole down,
    /// stored as `(u, 1 - v)` for Y-flipped texture uploads.
    pub fn sphere(radius: f32, width_segments: u16, height_segments: u16) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let nx = -(u * 2.0 * PI).cos() * (v * PI).sin();
                let ny = (v * PI).cos();
                let nz = (u * 2.0 * PI).sin() * (v * PI).sin();
                vertices.extend_from_slice(&[radius * nx, radius * ny, radius * nz, u, 1.0 - v]);
            }
        }

        let row = width_segments + 1;
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                // The pole rows collapse to a point, so each emits one triangle.
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Mesh { vertices, indices }
    }

    /// Same surface seen from inside: every triangle's winding is flipped.
    pub fn inverted(mut self) -> Self {
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_vertices_lie_on_the_surface() {
        let mesh = Mesh::sphere(3.0, 32, 32);
        assert_eq!(mesh.vertex_count(), 33 * 33);
        for vertex in mesh.vertices.chunks_exact(VERTEX_STRIDE) {
            let r = (vertex[0] * vertex[0] + vertex[1] * vertex[1] + vertex[2] * vertex[2]).sqrt();
            assert!((r - 3.0).abs() < 1e-4);
            assert!((0.0..=1.0).contains(&vertex[3]));
            assert!((0.0..=1.0).contains(&vertex[4]));
        }
    }

    #[test]
    fn sphere_index_count() {
        let mesh = Mesh::sphere(1.0, 32, 32);
        // Two triangles per quad minus one per quad on each pole row.
        assert_eq!(mesh.indices.len(), (32 * 32 * 2 - 2 * 32) * 3);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn large_backdrop_fits_u16_indices() {
        let mesh = Mesh::sphere(80.0, 64, 64);
        assert_eq!(mesh.vertex_count(), 65 * 65);
    }

    #[test]
    fn outward_winding_and_inversion() {
        let mesh = Mesh::sphere(1.0, 8, 8);
        let outward = face_normal_dot_position(&mesh, 8 * 3);
        assert!(outward > 0.0);

        let inner = Mesh::sphere(1.0, 8, 8).inverted();
        assert!(face_normal_dot_position(&inner, 8 * 3) < 0.0);
        assert_eq!(inner.vertices, mesh.vertices);
    }

    fn face_normal_dot_position(mesh: &Mesh, start: usize) -> f32 {
        let p = |i: u16| {
            let base = i as usize * VERTEX_STRIDE;
            [mesh.vertices[base], mesh.vertices[base + 1], mesh.vertices[base + 2]]
        };
        let [a, b, c] = [p(mesh.indices[start]), p(mesh.indices[start + 1]), p(mesh.indices[start + 2])];
        let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let n = [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ];
        n[0] * a[0] + n[1] * a[1] + n[2] * a[2]
    }
}
