use rand::Rng;

/// A fixed point cloud. Positions and colors are generated once and never resized.
pub struct ParticleCloud {
    positions: Vec<f32>,
    colors: Vec<f32>,
    dirty: bool,
}

impl ParticleCloud {
    /// `count` points uniformly spread through a cube of side `extent` centered on the origin.
    pub fn generate<R: Rng>(count: usize, extent: f32, rng: &mut R) -> Self {
        let mut positions = Vec::with_capacity(count * 3);
        let mut colors = Vec::with_capacity(count * 3);
        for _ in 0..count * 3 {
            positions.push((rng.gen::<f32>() - 0.5) * extent);
            colors.push(rng.gen::<f32>());
        }
        ParticleCloud { positions, colors, dirty: true }
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears the flag, returning whether the position buffer needs uploading.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn points_stay_inside_the_cube() {
        let mut rng = SmallRng::seed_from_u64(7);
        let cloud = ParticleCloud::generate(20_000, 10.0, &mut rng);
        assert_eq!(cloud.len(), 20_000);
        assert_eq!(cloud.positions().len(), 60_000);
        assert_eq!(cloud.colors().len(), 60_000);
        assert!(cloud.positions().iter().all(|p| (-5.0..5.0).contains(p)));
        assert!(cloud.colors().iter().all(|c| (0.0..1.0).contains(c)));
    }

    #[test]
    fn dirty_flag_is_consumed() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut cloud = ParticleCloud::generate(4, 1.0, &mut rng);
        assert!(cloud.take_dirty());
        assert!(!cloud.take_dirty());
        cloud.mark_dirty();
        assert!(cloud.take_dirty());
    }

    #[test]
    fn empty_cloud() {
        let mut rng = SmallRng::seed_from_u64(1);
        let cloud = ParticleCloud::generate(0, 10.0, &mut rng);
        assert!(cloud.is_empty());
    }
}
