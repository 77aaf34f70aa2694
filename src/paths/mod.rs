//! Route geometry: the path query contract the motion engine consumes and
//! the registry of mounted route curves that implements it.

use bevy::prelude::*;
use bevy::utils::HashMap;

pub mod curve;
pub mod svg;

pub use curve::RouteCurve;

use crate::config::RouteConfig;
use crate::error::{MapError, MapResult};

/// Progress offset used to sample the tangent on either side of a point.
pub const TANGENT_EPSILON: f32 = 0.002;

/// Geometry of a single route, queried by normalized progress.
pub trait RoutePath {
    /// Total arc length in path units.
    fn total_length(&self) -> f32;

    /// Point at `progress` (clamped to [0, 1]) of the total length.
    fn point_at(&self, progress: f32) -> Vec2;

    /// Heading in degrees at `progress`, from two samples either side of it.
    fn tangent_angle_at(&self, progress: f32) -> f32 {
        let p1 = self.point_at((progress - TANGENT_EPSILON).max(0.0));
        let p2 = self.point_at((progress + TANGENT_EPSILON).min(1.0));
        (p2.y - p1.y).atan2(p2.x - p1.x).to_degrees()
    }
}

/// Lookup of route geometry by route id.
pub trait PathQuery {
    fn resolve(&self, route: &str) -> MapResult<&dyn RoutePath>;

    fn total_length(&self, route: &str) -> MapResult<f32> {
        Ok(self.resolve(route)?.total_length())
    }

    fn point_at(&self, route: &str, progress: f32) -> MapResult<Vec2> {
        Ok(self.resolve(route)?.point_at(progress))
    }

    fn tangent_angle_at(&self, route: &str, progress: f32) -> MapResult<f32> {
        Ok(self.resolve(route)?.tangent_angle_at(progress))
    }
}

/// Mounted route curves, keyed by route id.
#[derive(Resource, Default, Clone)]
pub struct RoutePaths {
    curves: HashMap<String, RouteCurve>,
}

impl RoutePaths {
    /// Parse and mount every configured route. Routes that fail to parse
    /// stay unmounted and their errors are returned.
    pub fn from_routes(routes: &[RouteConfig]) -> (Self, Vec<MapError>) {
        let mut paths = Self::default();
        let mut errors = Vec::new();
        for route in routes {
            match RouteCurve::from_path_data(&route.id, &route.path_data) {
                Ok(curve) => paths.mount(&route.id, curve),
                Err(err) => errors.push(err),
            }
        }
        (paths, errors)
    }

    pub fn mount(&mut self, route: &str, curve: RouteCurve) {
        self.curves.insert(route.to_string(), curve);
    }

    pub fn unmount(&mut self, route: &str) -> Option<RouteCurve> {
        self.curves.remove(route)
    }

    pub fn contains(&self, route: &str) -> bool {
        self.curves.contains_key(route)
    }

    pub fn get(&self, route: &str) -> Option<&RouteCurve> {
        self.curves.get(route)
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

impl PathQuery for RoutePaths {
    fn resolve(&self, route: &str) -> MapResult<&dyn RoutePath> {
        self.curves
            .get(route)
            .map(|c| c as &dyn RoutePath)
            .ok_or_else(|| MapError::missing(route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: &str, data: &str) -> RouteConfig {
        RouteConfig {
            id: id.to_string(),
            path_data: data.to_string(),
            ..RouteConfig::default()
        }
    }

    #[test]
    fn mounts_valid_routes_and_reports_broken_ones() {
        let (paths, errors) = RoutePaths::from_routes(&[
            route("a", "M0 0 L100 0"),
            route("b", "M0 0 A5 5 0 0 1 10 10"),
        ]);
        assert!(paths.contains("a"));
        assert!(!paths.contains("b"));
        assert_eq!(paths.len(), 1);
        assert!(matches!(errors.as_slice(), [MapError::InvalidPathData { route, .. }] if route == "b"));
    }

    #[test]
    fn query_by_route_id() {
        let (paths, _) = RoutePaths::from_routes(&[route("a", "M0 0 L100 0")]);
        assert!((paths.total_length("a").unwrap() - 100.0).abs() < 1e-4);
        assert!((paths.point_at("a", 0.25).unwrap() - Vec2::new(25.0, 0.0)).length() < 1e-4);
        assert!(paths.tangent_angle_at("a", 0.25).unwrap().abs() < 1e-3);
    }

    #[test]
    fn unknown_route_is_missing_geometry() {
        let paths = RoutePaths::default();
        assert_eq!(
            paths.point_at("ghost", 0.5).unwrap_err(),
            MapError::MissingRouteGeometry {
                route: "ghost".to_string()
            }
        );
    }

    #[test]
    fn unmount_makes_route_unresolvable() {
        let (mut paths, _) = RoutePaths::from_routes(&[route("a", "M0 0 L100 0")]);
        assert!(paths.unmount("a").is_some());
        assert!(paths.resolve("a").is_err());
        assert!(paths.is_empty());
    }
}
