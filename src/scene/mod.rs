//! Per-frame scene update: drives every indicator through the motion
//! engine and every route through pointer proximity, producing plain frame
//! data for the presentation layer.
//!
//! The scene is the single owner of all indicator state. Pointer samples
//! are written by the input set and read once per frame as a snapshot.

use bevy::math::Affine2;
use bevy::prelude::*;
use bevy::utils::HashSet;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub mod hover;

pub use hover::RouteStroke;

use crate::config::{HoverConfig, LivingMapConfig, MotionTuning, RouteConfig};
use crate::error::MapError;
use crate::geometry::edge_fade;
use crate::motion::Indicator;
use crate::paths::{PathQuery, RoutePaths};

pub struct LivingMapPlugin;

impl Plugin for LivingMapPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LivingMapConfig>()
            .init_resource::<MotionTuning>()
            .init_resource::<HoverConfig>()
            .init_resource::<MotionPreference>()
            .init_resource::<PointerSnapshot>()
            .init_resource::<FrameClock>()
            .init_resource::<LatestFrame>()
            .configure_sets(
                Update,
                (MapSet::Input, MapSet::Simulate, MapSet::Present).chain(),
            )
            .add_systems(Startup, setup_scene)
            .add_systems(
                Update,
                (
                    log_motion_preference.run_if(resource_changed::<MotionPreference>),
                    suspend_scene.run_if(motion_reduced),
                    drive_scene.run_if(not(motion_reduced)),
                )
                    .chain()
                    .in_set(MapSet::Simulate),
            );
    }
}

/// Ordering of the living map systems within a frame.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapSet {
    /// Pointer sampling and preference toggles.
    Input,
    /// Motion engine and hover calculation.
    Simulate,
    /// Applying frame data to visuals.
    Present,
}

/// Global reduced-motion toggle. While set, no frames are simulated.
#[derive(Resource, Default, Debug)]
pub struct MotionPreference {
    pub reduced: bool,
}

/// Latest pointer position in path coordinates, if the pointer is over the map.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct PointerSnapshot(pub Option<Vec2>);

/// Output of the most recent simulated frame. `None` while suspended.
#[derive(Resource, Default, Debug)]
pub struct LatestFrame(pub Option<SceneFrame>);

fn motion_reduced(preference: Res<MotionPreference>) -> bool {
    preference.reduced
}

/// Turns host timestamps into per-frame `dt`.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct FrameClock {
    last: Option<f64>,
}

impl FrameClock {
    /// Seconds since the previous tick, capped at `max_dt`. The first tick
    /// after construction or [`FrameClock::reset`] returns 0.
    pub fn tick(&mut self, now: f64, max_dt: f32) -> f32 {
        let dt = match self.last {
            Some(last) => ((now - last) as f32).clamp(0.0, max_dt),
            None => 0.0,
        };
        self.last = Some(now);
        dt
    }

    /// Forget the previous timestamp, e.g. when the loop is suspended.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn is_running(&self) -> bool {
        self.last.is_some()
    }
}

/// Where and how visibly to draw one indicator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndicatorPose {
    pub translation: Vec2,
    /// Heading in degrees.
    pub angle: f32,
    pub opacity: f32,
}

impl IndicatorPose {
    /// Translation composed with rotation, in path coordinates.
    pub fn to_affine(&self) -> Affine2 {
        Affine2::from_angle_translation(self.angle.to_radians(), self.translation)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IndicatorFrame {
    pub id: String,
    /// `None` when the indicator was skipped this frame.
    pub pose: Option<IndicatorPose>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RouteFrame {
    pub id: String,
    pub stroke: RouteStroke,
}

/// The pointer-following glow.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Glow {
    #[default]
    Hidden,
    Visible(Vec2),
}

/// Everything the presentation layer needs for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneFrame {
    pub indicators: Vec<IndicatorFrame>,
    pub routes: Vec<RouteFrame>,
    pub glow: Glow,
}

/// All live indicators and the routes they run on.
#[derive(Resource)]
pub struct Scene {
    indicators: Vec<Indicator>,
    routes: Vec<RouteConfig>,
    rng: StdRng,
    /// Routes already reported as missing, so the warning fires once.
    reported_missing: HashSet<String>,
}

impl Scene {
    /// Build the scene from configuration. Indicators that cannot be built
    /// are left out and their errors returned.
    pub fn from_config(config: &LivingMapConfig) -> (Self, Vec<MapError>) {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut errors = Vec::new();
        let mut indicators = Vec::with_capacity(config.indicators.len());

        for indicator in &config.indicators {
            let Some(route) = config.route(&indicator.route_id) else {
                errors.push(MapError::InvalidConfiguration {
                    indicator: indicator.id.clone(),
                    reason: format!("unknown route `{}`", indicator.route_id),
                });
                continue;
            };
            match Indicator::from_config(indicator, route, &mut rng) {
                Ok(indicator) => indicators.push(indicator),
                Err(err) => errors.push(err),
            }
        }

        let scene = Self {
            indicators,
            routes: config.routes.clone(),
            rng,
            reported_missing: HashSet::default(),
        };
        (scene, errors)
    }

    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    pub fn routes(&self) -> &[RouteConfig] {
        &self.routes
    }

    /// Simulate one frame.
    pub fn advance<P: PathQuery + ?Sized>(
        &mut self,
        dt: f32,
        pointer: Option<Vec2>,
        paths: &P,
        tuning: &MotionTuning,
        hover_config: &HoverConfig,
    ) -> SceneFrame {
        let mut indicators = Vec::with_capacity(self.indicators.len());
        for indicator in &mut self.indicators {
            let pose = match indicator.step(paths, dt, tuning, &mut self.rng) {
                Ok(()) => Some(IndicatorPose {
                    translation: indicator.position,
                    angle: indicator.angle,
                    opacity: indicator.opacity * edge_fade(indicator.progress),
                }),
                Err(err) => {
                    if self.reported_missing.insert(indicator.route_id.clone()) {
                        warn!("Skipping indicator {}: {}", indicator.id, err);
                    }
                    None
                }
            };
            indicators.push(IndicatorFrame {
                id: indicator.id.clone(),
                pose,
            });
        }

        let routes = self
            .routes
            .iter()
            .map(|route| {
                let stroke = match paths.resolve(&route.id) {
                    Ok(path) => hover::route_stroke(route, path, pointer, hover_config),
                    Err(_) => RouteStroke::Base,
                };
                RouteFrame {
                    id: route.id.clone(),
                    stroke,
                }
            })
            .collect();

        let glow = pointer.map_or(Glow::Hidden, Glow::Visible);

        SceneFrame {
            indicators,
            routes,
            glow,
        }
    }
}

/// Mount route geometry and build the indicator set.
fn setup_scene(
    mut commands: Commands,
    config: Res<LivingMapConfig>,
    mut preference: ResMut<MotionPreference>,
) {
    let (paths, path_errors) = RoutePaths::from_routes(&config.routes);
    for err in &path_errors {
        warn!("{}", err);
    }

    let (scene, config_errors) = Scene::from_config(&config);
    for err in &config_errors {
        warn!("Excluding indicator: {}", err);
    }

    info!(
        "Living map ready: {} of {} routes mounted, {} indicators",
        paths.len(),
        config.routes.len(),
        scene.indicators().len()
    );

    preference.reduced = config.prefers_reduced_motion;
    commands.insert_resource(paths);
    commands.insert_resource(scene);
}

fn drive_scene(
    time: Res<Time>,
    tuning: Res<MotionTuning>,
    hover: Res<HoverConfig>,
    pointer: Res<PointerSnapshot>,
    paths: Option<Res<RoutePaths>>,
    scene: Option<ResMut<Scene>>,
    mut clock: ResMut<FrameClock>,
    mut latest: ResMut<LatestFrame>,
) {
    let (Some(paths), Some(mut scene)) = (paths, scene) else {
        return;
    };

    let dt = clock.tick(time.elapsed_secs_f64(), tuning.max_frame_dt);
    latest.0 = Some(scene.advance(dt, pointer.0, &*paths, &tuning, &hover));
}

/// Release the frame clock while motion is disabled so resuming does not
/// produce one huge step.
fn suspend_scene(mut clock: ResMut<FrameClock>, mut latest: ResMut<LatestFrame>) {
    if clock.is_running() {
        clock.reset();
    }
    if latest.0.is_some() {
        latest.0 = None;
    }
}

fn log_motion_preference(preference: Res<MotionPreference>) {
    if preference.reduced {
        info!("Reduced motion: living map paused");
    } else {
        info!("Living map animation running");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndicatorConfig;
    use crate::motion::MotionState;
    use crate::paths::RouteCurve;
    use smallvec::smallvec;

    fn line_config() -> LivingMapConfig {
        LivingMapConfig {
            view_box: Vec2::new(200.0, 200.0),
            seed: 42,
            prefers_reduced_motion: false,
            routes: vec![RouteConfig {
                id: "line".to_string(),
                path_data: "M0 0 L100 0".to_string(),
                base_opacity: 0.4,
                stroke_width: 3.0,
                ..default()
            }],
            indicators: vec![IndicatorConfig {
                id: "a".to_string(),
                route_id: "line".to_string(),
                start_offset: 0.0,
                base_speed: 10.0,
                opacity: 0.8,
                ..default()
            }],
        }
    }

    fn mounted(config: &LivingMapConfig) -> RoutePaths {
        let (paths, errors) = RoutePaths::from_routes(&config.routes);
        assert!(errors.is_empty());
        paths
    }

    #[test]
    fn unknown_route_indicators_are_excluded() {
        let mut config = line_config();
        config.indicators.push(IndicatorConfig {
            id: "lost".to_string(),
            route_id: "nowhere".to_string(),
            ..default()
        });

        let (scene, errors) = Scene::from_config(&config);
        assert_eq!(scene.indicators().len(), 1);
        assert_eq!(scene.indicators()[0].id, "a");
        assert!(matches!(
            errors.as_slice(),
            [MapError::InvalidConfiguration { indicator, .. }] if indicator == "lost"
        ));
    }

    #[test]
    fn frame_poses_follow_the_route() {
        let config = line_config();
        let paths = mounted(&config);
        let (mut scene, _) = Scene::from_config(&config);

        let frame = scene.advance(
            1.0,
            None,
            &paths,
            &MotionTuning::default(),
            &HoverConfig::default(),
        );

        let pose = frame.indicators[0].pose.expect("indicator should move");
        assert!((pose.translation.x - 10.0).abs() <= 0.5 + 1e-4);
        assert!(pose.translation.y.abs() < 1e-5);
        assert!(pose.angle.abs() < 1e-3);
        // Progress ~0.1 is past the fade-in zone.
        assert!((pose.opacity - 0.8).abs() < 1e-5);
        assert_eq!(frame.glow, Glow::Hidden);
        assert_eq!(frame.routes[0].stroke, RouteStroke::Base);
    }

    #[test]
    fn opacity_fades_near_route_start() {
        let config = line_config();
        let paths = mounted(&config);
        let (mut scene, _) = Scene::from_config(&config);

        let frame = scene.advance(
            0.0,
            None,
            &paths,
            &MotionTuning::default(),
            &HoverConfig::default(),
        );
        let pose = frame.indicators[0].pose.unwrap();
        assert_eq!(pose.opacity, 0.0);
    }

    #[test]
    fn pointer_drives_highlight_and_glow() {
        let config = line_config();
        let paths = mounted(&config);
        let (mut scene, _) = Scene::from_config(&config);
        let tuning = MotionTuning::default();
        let hover = HoverConfig::default();

        let pointer = Vec2::new(0.0, 0.0);
        let frame = scene.advance(0.016, Some(pointer), &paths, &tuning, &hover);
        assert_eq!(frame.glow, Glow::Visible(pointer));
        let (opacity, width) = frame.routes[0].stroke.resolve(&config.routes[0]);
        assert!((opacity - 0.6).abs() < 1e-5);
        assert!((width - 3.8).abs() < 1e-5);

        let frame = scene.advance(0.016, None, &paths, &tuning, &hover);
        assert_eq!(frame.glow, Glow::Hidden);
        assert_eq!(frame.routes[0].stroke, RouteStroke::Base);
    }

    #[test]
    fn missing_geometry_is_isolated_per_indicator() {
        let mut config = line_config();
        config.routes.push(RouteConfig {
            id: "unmounted".to_string(),
            path_data: "M0 0 L50 50".to_string(),
            stop_nodes: smallvec![0.5],
            ..default()
        });
        config.indicators.push(IndicatorConfig {
            id: "b".to_string(),
            route_id: "unmounted".to_string(),
            start_offset: 0.3,
            ..default()
        });

        let mut paths = RoutePaths::default();
        paths.mount("line", RouteCurve::from_path_data("line", "M0 0 L100 0").unwrap());
        let (mut scene, errors) = Scene::from_config(&config);
        assert!(errors.is_empty());

        let frame = scene.advance(
            0.1,
            Some(Vec2::new(25.0, 25.0)),
            &paths,
            &MotionTuning::default(),
            &HoverConfig::default(),
        );

        assert!(frame.indicators[0].pose.is_some());
        assert!(frame.indicators[1].pose.is_none());
        assert_eq!(scene.indicators()[1].progress, 0.3);
        assert_eq!(scene.indicators()[1].motion, MotionState::Cruising);
        assert_eq!(frame.routes[1].stroke, RouteStroke::Base);
        assert!(matches!(frame.routes[0].stroke, RouteStroke::Highlighted { .. }));
    }

    #[test]
    fn same_seed_gives_same_run() {
        let mut config = line_config();
        config.routes[0].stop_nodes = smallvec![0.2, 0.6];
        let paths = mounted(&config);
        let tuning = MotionTuning::default();
        let hover = HoverConfig::default();

        let run = || {
            let (mut scene, _) = Scene::from_config(&config);
            for _ in 0..899 {
                scene.advance(1.0 / 30.0, None, &paths, &tuning, &hover);
            }
            let last = scene.advance(1.0 / 30.0, None, &paths, &tuning, &hover);
            (last, scene.indicators()[0].clone())
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn pose_affine_rotates_then_translates() {
        let pose = IndicatorPose {
            translation: Vec2::new(10.0, 20.0),
            angle: 90.0,
            opacity: 1.0,
        };
        let tip = pose.to_affine().transform_point2(Vec2::new(1.0, 0.0));
        assert!((tip - Vec2::new(10.0, 21.0)).length() < 1e-5);
    }

    #[test]
    fn frame_clock_caps_and_restarts() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.tick(10.0, 0.1), 0.0);
        assert!((clock.tick(10.016, 0.1) - 0.016).abs() < 1e-5);
        // A long pause (backgrounded tab) is capped.
        assert_eq!(clock.tick(25.0, 0.1), 0.1);

        clock.reset();
        assert!(!clock.is_running());
        assert_eq!(clock.tick(60.0, 0.1), 0.0);
    }

    #[test]
    fn plugin_builds_scene_headless() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(line_config());
        app.add_plugins(LivingMapPlugin);

        app.update();
        app.update();

        let scene = app.world().resource::<Scene>();
        assert_eq!(scene.indicators().len(), 1);
        assert_eq!(app.world().resource::<RoutePaths>().len(), 1);
        let latest = app.world().resource::<LatestFrame>();
        let frame = latest.0.as_ref().expect("a frame should have been simulated");
        assert_eq!(frame.indicators.len(), 1);
        assert_eq!(frame.routes.len(), 1);
    }

    #[test]
    fn reduced_motion_suspends_the_loop() {
        let mut config = line_config();
        config.prefers_reduced_motion = true;

        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(config);
        app.add_plugins(LivingMapPlugin);

        app.update();
        app.update();

        assert!(app.world().resource::<MotionPreference>().reduced);
        assert!(app.world().resource::<LatestFrame>().0.is_none());
        assert!(!app.world().resource::<FrameClock>().is_running());
        assert_eq!(app.world().resource::<Scene>().indicators()[0].progress, 0.0);

        app.world_mut().resource_mut::<MotionPreference>().reduced = false;
        app.update();
        assert!(app.world().resource::<LatestFrame>().0.is_some());
        assert!(app.world().resource::<FrameClock>().is_running());
    }
}
