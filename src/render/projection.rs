//! Mapping between path coordinates (SVG view box, y down, origin top-left)
//! and Bevy world coordinates (y up, origin at the view box centre).

use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapProjection {
    pub view_box: Vec2,
}

impl MapProjection {
    pub fn new(view_box: Vec2) -> Self {
        Self { view_box }
    }

    pub fn path_to_world(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x - self.view_box.x / 2.0, self.view_box.y / 2.0 - p.y)
    }

    pub fn world_to_path(&self, w: Vec2) -> Vec2 {
        Vec2::new(w.x + self.view_box.x / 2.0, self.view_box.y / 2.0 - w.y)
    }

    /// World rotation (radians, counter-clockwise) for a path heading in degrees.
    pub fn heading_to_world(&self, degrees: f32) -> f32 {
        -degrees.to_radians()
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.view_box.x && p.y <= self.view_box.y
    }

    /// Orthographic scale that covers a window with the view box, cropping
    /// the overflowing axis.
    pub fn cover_scale(&self, window: Vec2) -> f32 {
        if window.x <= 0.0 || window.y <= 0.0 {
            return 1.0;
        }
        (self.view_box.x / window.x).min(self.view_box.y / window.y)
    }
}
