//! Static map configuration: routes, indicators, and engine tuning.

use bevy::prelude::*;
use smallvec::{smallvec, SmallVec};

/// A route definition. Read-only once the scene is built.
#[derive(Clone, Debug)]
pub struct RouteConfig {
    pub id: String,
    /// SVG path data (`d` attribute) in view box coordinates.
    pub path_data: String,
    pub stroke_color: Color,
    pub base_opacity: f32,
    pub stroke_width: f32,
    /// Relative speed of indicators on this route; divides their traversal time.
    pub speed_multiplier: f32,
    /// Normalized positions where indicators pause, in travel order.
    pub stop_nodes: SmallVec<[f32; 4]>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            path_data: String::new(),
            stroke_color: Color::srgb(0.0, 0.659, 0.886),
            base_opacity: 0.0,
            stroke_width: 2.0,
            speed_multiplier: 1.0,
            stop_nodes: SmallVec::new(),
        }
    }
}

/// A moving marker bound to one route.
#[derive(Clone, Debug)]
pub struct IndicatorConfig {
    pub id: String,
    pub route_id: String,
    /// Initial progress along the route.
    pub start_offset: f32,
    /// Seconds for one full traversal at cruising speed.
    pub base_speed: f32,
    pub size: f32,
    pub opacity: f32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            route_id: String::new(),
            start_offset: 0.0,
            base_speed: 30.0,
            size: 1.0,
            opacity: 0.9,
        }
    }
}

/// Configuration for the living map.
#[derive(Resource, Clone, Debug)]
pub struct LivingMapConfig {
    /// Size of the path coordinate space.
    pub view_box: Vec2,
    /// Seed for stop durations and speed jitter.
    pub seed: u64,
    /// Start with the frame loop disabled.
    pub prefers_reduced_motion: bool,
    pub routes: Vec<RouteConfig>,
    pub indicators: Vec<IndicatorConfig>,
}

impl LivingMapConfig {
    pub fn route(&self, id: &str) -> Option<&RouteConfig> {
        self.routes.iter().find(|r| r.id == id)
    }
}

impl Default for LivingMapConfig {
    fn default() -> Self {
        let route = |id: &str, d: &str, width: f32, speed: f32, stops: SmallVec<[f32; 4]>| {
            RouteConfig {
                id: id.to_string(),
                path_data: d.to_string(),
                stroke_width: width,
                speed_multiplier: speed,
                stop_nodes: stops,
                ..default()
            }
        };
        let indicator = |id: &str, route_id: &str, offset: f32, speed: f32, opacity: f32| {
            IndicatorConfig {
                id: id.to_string(),
                route_id: route_id.to_string(),
                start_offset: offset,
                base_speed: speed,
                opacity,
                ..default()
            }
        };

        Self {
            view_box: Vec2::new(1440.0, 900.0),
            seed: 20_241_017,
            prefers_reduced_motion: false,
            routes: vec![
                route(
                    "harbour-line",
                    "M-20 640 C180 610 320 520 470 530 S760 660 920 600 S1220 420 1460 450",
                    3.0,
                    1.0,
                    smallvec![0.32, 0.68],
                ),
                route(
                    "ridge-road",
                    "M120 -20 C160 140 300 220 420 300 S620 420 700 560 Q760 700 900 760 T1180 920",
                    2.5,
                    0.8,
                    smallvec![0.45],
                ),
                route(
                    "river-express",
                    "M-20 260 L260 250 C420 244 520 180 700 190 S980 300 1120 260 L1460 220",
                    3.5,
                    1.3,
                    smallvec![0.25, 0.55, 0.82],
                ),
                route(
                    "north-loop",
                    "M980 -20 C1000 120 1120 180 1240 170 S1400 80 1460 120",
                    2.0,
                    0.9,
                    SmallVec::new(),
                ),
            ],
            indicators: vec![
                indicator("harbour-a", "harbour-line", 0.05, 38.0, 0.95),
                indicator("harbour-b", "harbour-line", 0.55, 42.0, 0.85),
                indicator("ridge-a", "ridge-road", 0.12, 34.0, 0.9),
                indicator("ridge-b", "ridge-road", 0.7, 36.0, 0.8),
                indicator("river-a", "river-express", 0.0, 30.0, 0.95),
                indicator("river-b", "river-express", 0.4, 32.0, 0.9),
                indicator("river-c", "river-express", 0.78, 29.0, 0.85),
                indicator("north-a", "north-loop", 0.3, 26.0, 0.8),
            ],
        }
    }
}

/// Timing and shape constants of the motion engine.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct MotionTuning {
    /// Seconds to brake from cruising to standstill.
    pub decel_duration: f32,
    /// Seconds to ramp back up to cruising speed.
    pub accel_duration: f32,
    /// Progress distance before a stop at which braking begins.
    pub decel_zone: f32,
    pub stop_min: f32,
    pub stop_max: f32,
    /// Relative amplitude of the cruising speed wobble.
    pub jitter_amplitude: f32,
    /// Wobble cycles per unit of progress. A visual parameter, not a
    /// physical one: it is independent of route length.
    pub jitter_frequency: f32,
    /// Largest `dt` a single frame may consume.
    pub max_frame_dt: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            decel_duration: 2.0,
            accel_duration: 1.5,
            decel_zone: 0.04,
            stop_min: 2.0,
            stop_max: 4.0,
            jitter_amplitude: 0.05,
            jitter_frequency: 20.0,
            max_frame_dt: 0.1,
        }
    }
}

/// Pointer proximity highlighting.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct HoverConfig {
    /// Distance in path units at which a route stops reacting.
    pub radius: f32,
    pub opacity_boost: f32,
    pub stroke_boost: f32,
    /// Intervals the route is split into when measuring pointer distance.
    pub samples: usize,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            radius: 120.0,
            opacity_boost: 0.2,
            stroke_boost: 0.8,
            samples: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::RoutePaths;

    #[test]
    fn demo_map_routes_all_parse() {
        let config = LivingMapConfig::default();
        let (paths, errors) = RoutePaths::from_routes(&config.routes);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(paths.len(), config.routes.len());
    }

    #[test]
    fn demo_indicators_reference_known_routes() {
        let config = LivingMapConfig::default();
        for indicator in &config.indicators {
            assert!(config.route(&indicator.route_id).is_some(), "{}", indicator.id);
            assert!((0.0..1.0).contains(&indicator.start_offset));
        }
    }

    #[test]
    fn demo_stop_nodes_are_ordered_and_normalized() {
        for route in LivingMapConfig::default().routes {
            assert!(route.stop_nodes.windows(2).all(|w| w[0] < w[1]), "{}", route.id);
            assert!(route.stop_nodes.iter().all(|s| (0.0..1.0).contains(s)));
            assert!(route.speed_multiplier > 0.0);
        }
    }

    #[test]
    fn stop_range_is_well_formed() {
        let tuning = MotionTuning::default();
        assert!(tuning.stop_min < tuning.stop_max);
        assert!(tuning.decel_zone > 0.0);
    }
}
