//! Living Map - an animated route overlay.
//!
//! Indicators travel along route curves, brake for stops, wait, and pull
//! away again, while routes near the pointer light up. The simulation is
//! plain data ([`scene::Scene`]) driven by Bevy systems; [`render`] maps
//! each frame onto sprites.

pub mod config;
pub mod error;
pub mod geometry;
pub mod motion;
pub mod paths;
pub mod render;
pub mod scene;

pub use config::{HoverConfig, IndicatorConfig, LivingMapConfig, MotionTuning, RouteConfig};
pub use error::{MapError, MapResult};
pub use motion::{Indicator, MotionState};
pub use paths::{PathQuery, RouteCurve, RoutePath, RoutePaths};
pub use render::MapRenderPlugin;
pub use scene::{LivingMapPlugin, Scene, SceneFrame};
