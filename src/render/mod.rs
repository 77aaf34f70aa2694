//! Presentation layer: draws routes, indicators and the hover glow from the
//! latest scene frame, and feeds pointer input back into the scene.

use bevy::color::Alpha;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

pub mod projection;
pub mod transition;

pub use projection::MapProjection;
use transition::Transition;

use crate::config::{HoverConfig, LivingMapConfig, RouteConfig};
use crate::paths::RoutePaths;
use crate::scene::{Glow, LatestFrame, MapSet, MotionPreference, PointerSnapshot, RouteStroke, Scene};

/// Indicator footprint in path units, before per-indicator size scaling.
pub const INDICATOR_WIDTH: f32 = 8.0 * 1.12;
pub const INDICATOR_HEIGHT: f32 = 4.0 * 1.12;

/// Peak opacity of the glow at full visibility.
const GLOW_ALPHA: f32 = 0.06;
const STROKE_TRANSITION_SECS: f32 = 0.2;
const GLOW_TRANSITION_SECS: f32 = 0.6;

const ROUTE_Z: f32 = 0.0;
const GLOW_Z: f32 = 1.0;
const INDICATOR_Z: f32 = 2.0;

pub struct MapRenderPlugin;

impl Plugin for MapRenderPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::srgb_u8(0xE8, 0xF4, 0xFF)))
            .init_resource::<MapPalette>()
            .init_resource::<MapVisualsSpawned>()
            .init_resource::<StrokeTransitions>()
            .add_systems(Startup, spawn_camera)
            .add_systems(
                Update,
                (
                    fit_camera_to_window,
                    spawn_map_visuals.run_if(should_spawn_visuals),
                    toggle_reduced_motion,
                    track_pointer,
                )
                    .in_set(MapSet::Input),
            )
            .add_systems(
                Update,
                (apply_indicator_frames, apply_route_strokes, apply_glow).in_set(MapSet::Present),
            );
    }
}

/// Colours used by the overlay.
#[derive(Resource)]
pub struct MapPalette {
    pub indicator: Color,
    pub glow: Color,
}

impl Default for MapPalette {
    fn default() -> Self {
        Self {
            indicator: Color::srgb_u8(0x00, 0xA8, 0xE2),
            glow: Color::srgb_u8(0x00, 0xA8, 0xE2),
        }
    }
}

#[derive(Resource, Default)]
pub struct MapVisualsSpawned(pub bool);

/// Eased stroke opacity and width per route, indexed like `Scene::routes`.
#[derive(Resource, Default)]
pub struct StrokeTransitions(Vec<(Transition, Transition)>);

impl StrokeTransitions {
    fn reset(&mut self, routes: &[RouteConfig]) {
        self.0 = routes
            .iter()
            .map(|r| {
                (
                    Transition::new(r.base_opacity, STROKE_TRANSITION_SECS),
                    Transition::new(r.stroke_width, STROKE_TRANSITION_SECS),
                )
            })
            .collect();
    }
}

#[derive(Component)]
pub struct MapCamera;

/// Sprite for the indicator at this index of `Scene::indicators`.
#[derive(Component)]
pub struct IndicatorSprite {
    pub index: usize,
}

/// One straight piece of a route's stroke.
#[derive(Component)]
pub struct RouteSegment {
    pub route: usize,
}

#[derive(Component)]
pub struct HoverGlow {
    opacity: Transition,
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((Camera2d, MapCamera));
}

fn fit_camera_to_window(
    windows: Query<&Window, With<PrimaryWindow>>,
    config: Res<LivingMapConfig>,
    mut cameras: Query<&mut OrthographicProjection, With<MapCamera>>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let scale = MapProjection::new(config.view_box).cover_scale(window.size());
    for mut projection in cameras.iter_mut() {
        if (projection.scale - scale).abs() > f32::EPSILON {
            projection.scale = scale;
        }
    }
}

fn should_spawn_visuals(
    scene: Option<Res<Scene>>,
    paths: Option<Res<RoutePaths>>,
    spawned: Res<MapVisualsSpawned>,
) -> bool {
    scene.is_some() && paths.is_some() && !spawned.0
}

fn spawn_map_visuals(
    mut commands: Commands,
    scene: Res<Scene>,
    paths: Res<RoutePaths>,
    config: Res<LivingMapConfig>,
    hover: Res<HoverConfig>,
    palette: Res<MapPalette>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut transitions: ResMut<StrokeTransitions>,
    mut spawned: ResMut<MapVisualsSpawned>,
) {
    spawned.0 = true;
    let projection = MapProjection::new(config.view_box);

    let mut segment_count = 0;
    for (index, route) in scene.routes().iter().enumerate() {
        let Some(curve) = paths.get(&route.id) else {
            continue;
        };
        let color = route.stroke_color.with_alpha(route.base_opacity);

        for (a, b) in curve.vertices() {
            let a = projection.path_to_world(a);
            let b = projection.path_to_world(b);
            let mid = (a + b) / 2.0;
            commands.spawn((
                Sprite::from_color(color, Vec2::new(a.distance(b), route.stroke_width)),
                Transform::from_translation(mid.extend(ROUTE_Z))
                    .with_rotation(Quat::from_rotation_z((b - a).to_angle())),
                RouteSegment { route: index },
            ));
            segment_count += 1;
        }
    }
    transitions.reset(scene.routes());

    for (index, indicator) in scene.indicators().iter().enumerate() {
        commands.spawn((
            Sprite::from_color(
                palette.indicator.with_alpha(0.0),
                Vec2::new(INDICATOR_WIDTH, INDICATOR_HEIGHT) * indicator.size,
            ),
            Transform::from_xyz(0.0, 0.0, INDICATOR_Z),
            Visibility::Hidden,
            IndicatorSprite { index },
        ));
    }

    commands.spawn((
        Mesh2d(meshes.add(Circle::new(hover.radius))),
        MeshMaterial2d(materials.add(ColorMaterial::from(palette.glow.with_alpha(0.0)))),
        Transform::from_xyz(0.0, 0.0, GLOW_Z),
        HoverGlow {
            opacity: Transition::new(0.0, GLOW_TRANSITION_SECS),
        },
    ));

    info!(
        "Spawned {} route segments and {} indicators",
        segment_count,
        scene.indicators().len()
    );
}

/// `R` flips the reduced-motion preference.
fn toggle_reduced_motion(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut preference: ResMut<MotionPreference>,
) {
    if keyboard.just_pressed(KeyCode::KeyR) {
        preference.reduced = !preference.reduced;
    }
}

/// Sample the cursor into path coordinates. Leaving the map clears it.
fn track_pointer(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<MapCamera>>,
    config: Res<LivingMapConfig>,
    mut pointer: ResMut<PointerSnapshot>,
) {
    let projection = MapProjection::new(config.view_box);
    let sample = match (windows.get_single(), cameras.get_single()) {
        (Ok(window), Ok((camera, camera_transform))) => {
            cursor_in_path_space(window, camera, camera_transform, &projection)
        }
        _ => None,
    };

    if pointer.0 != sample {
        pointer.0 = sample;
    }
}

fn cursor_in_path_space(
    window: &Window,
    camera: &Camera,
    camera_transform: &GlobalTransform,
    projection: &MapProjection,
) -> Option<Vec2> {
    let cursor = window.cursor_position()?;
    let world = camera.viewport_to_world_2d(camera_transform, cursor).ok()?;
    let path = projection.world_to_path(world);
    projection.contains(path).then_some(path)
}

fn apply_indicator_frames(
    latest: Res<LatestFrame>,
    config: Res<LivingMapConfig>,
    mut sprites: Query<(&IndicatorSprite, &mut Transform, &mut Sprite, &mut Visibility)>,
) {
    let projection = MapProjection::new(config.view_box);

    // Suspended: indicators stay frozen out of sight.
    let Some(frame) = &latest.0 else {
        for (_, _, _, mut visibility) in sprites.iter_mut() {
            *visibility = Visibility::Hidden;
        }
        return;
    };

    for (marker, mut transform, mut sprite, mut visibility) in sprites.iter_mut() {
        let Some(pose) = frame.indicators.get(marker.index).and_then(|f| f.pose) else {
            continue;
        };
        let world = projection.path_to_world(pose.translation);
        transform.translation = world.extend(INDICATOR_Z);
        transform.rotation = Quat::from_rotation_z(projection.heading_to_world(pose.angle));
        sprite.color.set_alpha(pose.opacity);
        *visibility = Visibility::Inherited;
    }
}

fn apply_route_strokes(
    time: Res<Time>,
    latest: Res<LatestFrame>,
    scene: Option<Res<Scene>>,
    mut transitions: ResMut<StrokeTransitions>,
    mut segments: Query<(&RouteSegment, &mut Sprite)>,
) {
    let Some(scene) = scene else {
        return;
    };
    let dt = time.delta_secs();

    for (index, route) in scene.routes().iter().enumerate() {
        let stroke = latest
            .0
            .as_ref()
            .and_then(|f| f.routes.get(index))
            .map_or(RouteStroke::Base, |r| r.stroke);
        let (opacity, width) = stroke.resolve(route);

        let Some((opacity_t, width_t)) = transitions.0.get_mut(index) else {
            continue;
        };
        opacity_t.retarget(opacity);
        width_t.retarget(width);
        opacity_t.tick(dt);
        width_t.tick(dt);
    }

    for (segment, mut sprite) in segments.iter_mut() {
        let Some((opacity_t, width_t)) = transitions.0.get(segment.route) else {
            continue;
        };
        sprite.color.set_alpha(opacity_t.value());
        if let Some(size) = sprite.custom_size.as_mut() {
            size.y = width_t.value();
        }
    }
}

fn apply_glow(
    time: Res<Time>,
    latest: Res<LatestFrame>,
    config: Res<LivingMapConfig>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut glows: Query<(&mut HoverGlow, &mut Transform, &MeshMaterial2d<ColorMaterial>)>,
) {
    let projection = MapProjection::new(config.view_box);
    let glow = latest.0.as_ref().map_or(Glow::Hidden, |f| f.glow);

    for (mut state, mut transform, material) in glows.iter_mut() {
        match glow {
            Glow::Visible(at) => {
                transform.translation = projection.path_to_world(at).extend(GLOW_Z);
                state.opacity.retarget(1.0);
            }
            Glow::Hidden => state.opacity.retarget(0.0),
        }
        let opacity = state.opacity.tick(time.delta_secs());

        if let Some(material) = materials.get_mut(&material.0) {
            material.color.set_alpha(GLOW_ALPHA * opacity);
        }
    }
}
