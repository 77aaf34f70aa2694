//! Arc-length parameterised route curves.

use bevy::math::Vec2;

use super::svg::{parse_path_data, Segment};
use super::RoutePath;
use crate::error::{MapError, MapResult};

/// Number of straight pieces each curved segment is flattened into.
pub const CURVE_SUBDIVISIONS: usize = 24;

/// A straight piece of the flattened curve.
#[derive(Clone, Copy, Debug)]
struct Span {
    start: Vec2,
    end: Vec2,
    /// Arc length from the start of the route to `start`.
    offset: f32,
    length: f32,
}

/// A route flattened into a polyline with a cumulative length table.
///
/// Moveto jumps inside the path data do not add length, matching how
/// browsers measure `getTotalLength` on multi-subpath elements.
#[derive(Clone, Debug)]
pub struct RouteCurve {
    spans: Vec<Span>,
    length: f32,
}

impl RouteCurve {
    /// Build a curve from SVG path data.
    pub fn from_path_data(route: &str, data: &str) -> MapResult<Self> {
        let segments = parse_path_data(data).map_err(|reason| MapError::InvalidPathData {
            route: route.to_string(),
            reason,
        })?;
        Self::from_segments(route, &segments)
    }

    /// Build a curve from already parsed segments.
    pub fn from_segments(route: &str, segments: &[Segment]) -> MapResult<Self> {
        let mut spans = Vec::new();
        let mut offset = 0.0;

        for segment in segments {
            let steps = match segment {
                Segment::Line(..) => 1,
                Segment::Quadratic(..) | Segment::Cubic(..) => CURVE_SUBDIVISIONS,
            };
            let mut previous = segment.start();
            for i in 1..=steps {
                let point = segment.eval(i as f32 / steps as f32);
                let length = previous.distance(point);
                if length > 0.0 {
                    spans.push(Span {
                        start: previous,
                        end: point,
                        offset,
                        length,
                    });
                    offset += length;
                }
                previous = point;
            }
        }

        if spans.is_empty() || offset <= 0.0 {
            return Err(MapError::InvalidPathData {
                route: route.to_string(),
                reason: "path has zero length".to_string(),
            });
        }

        Ok(Self {
            spans,
            length: offset,
        })
    }

    /// Build a curve through a sequence of points.
    pub fn polyline(route: &str, points: &[Vec2]) -> MapResult<Self> {
        let segments: Vec<Segment> = points
            .windows(2)
            .map(|w| Segment::Line(w[0], w[1]))
            .collect();
        Self::from_segments(route, &segments)
    }

    /// Flattened vertices, for drawing the stroke.
    pub fn vertices(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.spans.iter().map(|s| (s.start, s.end))
    }
}

impl RoutePath for RouteCurve {
    fn total_length(&self) -> f32 {
        self.length
    }

    fn point_at(&self, progress: f32) -> Vec2 {
        let target = progress.clamp(0.0, 1.0) * self.length;
        let index = self
            .spans
            .partition_point(|s| s.offset + s.length < target)
            .min(self.spans.len() - 1);
        let span = &self.spans[index];
        let local_t = ((target - span.offset) / span.length).clamp(0.0, 1.0);
        span.start.lerp(span.end, local_t)
    }
}
