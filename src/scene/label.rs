use nalgebra::{Matrix4, Point3};

use crate::scene::viewport::Viewport;

/// Where the label's center lands on screen, in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelPlacement {
    pub x: f32,
    pub y: f32,
    pub visible: bool,
}

pub fn project_to_screen(world: &Point3<f32>, view_proj: &Matrix4<f32>, viewport: &Viewport) -> LabelPlacement {
    let clip = view_proj * world.to_homogeneous();
    if clip.w.abs() < f32::EPSILON {
        return LabelPlacement { x: 0.0, y: 0.0, visible: false };
    }
    let ndc = clip.xyz() / clip.w;
    let half_w = viewport.width / 2.0;
    let half_h = viewport.height / 2.0;
    LabelPlacement {
        x: ndc.x * half_w + half_w,
        y: -ndc.y * half_h + half_h,
        visible: (-1.0..=1.0).contains(&ndc.z),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelState {
    Pending,
    Attached,
}

/// A label waiting for the asset-loading-complete signal before it is placed.
#[derive(Clone, Debug)]
pub struct LabelAnchor {
    pub position: Point3<f32>,
    state: LabelState,
}

impl LabelAnchor {
    pub fn new(position: Point3<f32>) -> Self {
        LabelAnchor { position, state: LabelState::Pending }
    }

    pub fn state(&self) -> LabelState {
        self.state
    }

    /// Returns true exactly once: on the first call made after assets are ready.
    pub fn try_attach(&mut self, assets_ready: bool) -> bool {
        if assets_ready && self.state == LabelState::Pending {
            self.state = LabelState::Attached;
            return true;
        }
        false
    }
}
