//! Pointer proximity highlighting for routes.

use bevy::math::Vec2;

use crate::config::{HoverConfig, RouteConfig};
use crate::geometry::{distance, influence};
use crate::paths::RoutePath;

/// Stroke style a route should be drawn with this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RouteStroke {
    /// Back to the route's configured style.
    Base,
    Highlighted {
        influence: f32,
        opacity: f32,
        width: f32,
    },
}

impl RouteStroke {
    /// Resolved `(opacity, width)` for a route.
    pub fn resolve(&self, route: &RouteConfig) -> (f32, f32) {
        match *self {
            RouteStroke::Base => (route.base_opacity, route.stroke_width),
            RouteStroke::Highlighted { opacity, width, .. } => (opacity, width),
        }
    }
}

/// Smallest distance from `pointer` to `samples + 1` evenly spaced points
/// along the route, endpoints included.
pub fn nearest_sample_distance(path: &dyn RoutePath, pointer: Vec2, samples: usize) -> f32 {
    let samples = samples.max(1);
    (0..=samples)
        .map(|i| {
            let point = path.point_at(i as f32 / samples as f32);
            distance(pointer.x, pointer.y, point.x, point.y)
        })
        .fold(f32::INFINITY, f32::min)
}

/// Highlight for one route given the current pointer snapshot.
pub fn route_stroke(
    route: &RouteConfig,
    path: &dyn RoutePath,
    pointer: Option<Vec2>,
    hover: &HoverConfig,
) -> RouteStroke {
    let Some(pointer) = pointer else {
        return RouteStroke::Base;
    };

    let nearest = nearest_sample_distance(path, pointer, hover.samples);
    let influence = influence(nearest, hover.radius);
    RouteStroke::Highlighted {
        influence,
        opacity: route.base_opacity + influence * hover.opacity_boost,
        width: route.stroke_width + influence * hover.stroke_boost,
    }
}
