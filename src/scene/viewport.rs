use nalgebra::Vector2;

pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Window size in CSS pixels plus the effective device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        let mut viewport = Viewport { width: 1.0, height: 1.0, pixel_ratio: 1.0 };
        viewport.resize(width, height, device_pixel_ratio);
        viewport
    }

    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        self.pixel_ratio = device_pixel_ratio.clamp(f32::MIN_POSITIVE, MAX_PIXEL_RATIO);
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Size of the canvas drawing buffer in device pixels.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let w = (self.width * self.pixel_ratio).floor().max(1.0) as u32;
        let h = (self.height * self.pixel_ratio).floor().max(1.0) as u32;
        (w, h)
    }

    /// Client coordinates to normalized device coordinates, y up.
    pub fn normalize_pointer(&self, client_x: f32, client_y: f32) -> Vector2<f32> {
        Vector2::new(
            (client_x / self.width) * 2.0 - 1.0,
            -((client_y / self.height) * 2.0 - 1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_center_and_corners() {
        let viewport = Viewport::new(800.0, 600.0, 1.0);
        assert_eq!(viewport.normalize_pointer(400.0, 300.0), Vector2::new(0.0, 0.0));
        assert_eq!(viewport.normalize_pointer(0.0, 0.0), Vector2::new(-1.0, 1.0));
        assert_eq!(viewport.normalize_pointer(800.0, 600.0), Vector2::new(1.0, -1.0));
    }

    #[test]
    fn pixel_ratio_is_capped() {
        let viewport = Viewport::new(1024.0, 768.0, 3.0);
        assert_eq!(viewport.pixel_ratio, 2.0);
        assert_eq!(viewport.drawing_buffer_size(), (2048, 1536));

        let viewport = Viewport::new(1024.0, 768.0, 1.5);
        assert_eq!(viewport.pixel_ratio, 1.5);
        assert_eq!(viewport.drawing_buffer_size(), (1536, 1152));
    }

    #[test]
    fn degenerate_sizes_stay_positive() {
        let viewport = Viewport::new(0.0, 0.0, 1.0);
        assert!(viewport.aspect().is_finite());
        assert_eq!(viewport.drawing_buffer_size(), (1, 1));
    }
}
