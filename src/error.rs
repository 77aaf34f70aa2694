//! Error types for route geometry and map configuration.
//!
//! None of these are fatal: the frame loop isolates every failure to the
//! indicator or route that caused it.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// The route has no mounted geometry (yet).
    #[error("route `{route}` has no mounted geometry")]
    MissingRouteGeometry { route: String },

    /// An indicator cannot be built from its configuration, e.g. it is
    /// bound to a route that does not exist.
    #[error("indicator `{indicator}` is misconfigured: {reason}")]
    InvalidConfiguration { indicator: String, reason: String },

    /// Route path data could not be turned into a usable curve.
    #[error("route `{route}` has invalid path data: {reason}")]
    InvalidPathData { route: String, reason: String },
}

impl MapError {
    pub fn missing(route: &str) -> Self {
        Self::MissingRouteGeometry {
            route: route.to_string(),
        }
    }
}

pub type MapResult<T> = Result<T, MapError>;
