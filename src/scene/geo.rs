use nalgebra::Vector3;

pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

/// Latitude/longitude (degrees) to a point on the unit sphere, z toward the north pole.
pub fn lat_lon_to_unit(lat_deg: f32, lon_deg: f32) -> Vector3<f32> {
    let lat = degrees_to_radians(lat_deg);
    let lon = degrees_to_radians(lon_deg);
    Vector3::new(
        lat.cos() * lon.cos(),
        lat.cos() * lon.sin(),
        lat.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_is_unit_length() {
        let p = lat_lon_to_unit(28.6139, 77.2090);
        let len_sq = p.x * p.x + p.y * p.y + p.z * p.z;
        assert!((len_sq - 1.0).abs() < 1e-6, "got {}", len_sq);
    }

    #[test]
    fn anchor_matches_closed_form() {
        let lat = 28.6139_f32 * std::f32::consts::PI / 180.0;
        let lon = 77.2090_f32 * std::f32::consts::PI / 180.0;
        let p = lat_lon_to_unit(28.6139, 77.2090);
        assert_eq!(p.x, lat.cos() * lon.cos());
        assert_eq!(p.y, lat.cos() * lon.sin());
        assert_eq!(p.z, lat.sin());
    }

    #[test]
    fn poles_and_meridian() {
        let north = lat_lon_to_unit(90.0, 0.0);
        assert!((north.z - 1.0).abs() < 1e-6);
        let origin = lat_lon_to_unit(0.0, 0.0);
        assert!((origin - Vector3::x()).norm() < 1e-6);
    }
}
