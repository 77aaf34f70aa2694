//! Living Map - animated route overlay demo.
//!
//! Move the pointer over the map to highlight nearby routes.
//! Press R to toggle reduced motion.

use bevy::prelude::*;
use living_map::{LivingMapPlugin, MapRenderPlugin};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Living Map".into(),
                resolution: (1440., 900.).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(LivingMapPlugin)
        .add_plugins(MapRenderPlugin)
        .run();
}
