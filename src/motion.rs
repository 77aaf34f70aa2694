//! Indicator motion engine.
//!
//! Each indicator runs a four-state machine:
//!
//! cruising → decelerating → stopped → accelerating → cruising
//!
//! Braking starts a short distance before each stop node, the indicator
//! waits a random time at the stop, then eases back up to speed. Cruising
//! speed wobbles slightly so indicators on the same route drift apart.

use bevy::prelude::*;
use rand::Rng;
use smallvec::SmallVec;
use std::f32::consts::TAU;

use crate::config::{IndicatorConfig, MotionTuning, RouteConfig};
use crate::error::{MapError, MapResult};
use crate::geometry::{ease_in_cubic, ease_out_cubic};
use crate::paths::{PathQuery, RoutePath};

/// Current motion phase of an indicator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MotionState {
    #[default]
    Cruising,
    Decelerating,
    Stopped,
    Accelerating,
}

/// Runtime state of one moving marker.
#[derive(Clone, Debug, PartialEq)]
pub struct Indicator {
    pub id: String,
    pub route_id: String,

    /// Normalized distance along the route, in [0, 1).
    pub progress: f32,
    /// Derived from `progress` after every step.
    pub position: Vec2,
    /// Heading in degrees, derived from `progress` after every step.
    pub angle: f32,

    /// Seconds per full traversal.
    pub base_speed: f32,
    pub speed_multiplier: f32,
    pub jitter_seed: f32,

    pub motion: MotionState,
    /// Progress through the current phase, in [0, 1].
    pub state_progress: f32,

    pub stop_nodes: SmallVec<[f32; 4]>,
    /// Next stop to brake for. Equal to `stop_nodes.len()` once every stop
    /// of the current lap has been served.
    pub current_stop_index: usize,
    pub stop_duration: f32,
    pub stop_timer: f32,

    pub size: f32,
    pub opacity: f32,
}

impl Indicator {
    /// Build an indicator from its configuration and the route it is bound to.
    pub fn from_config(
        config: &IndicatorConfig,
        route: &RouteConfig,
        rng: &mut impl Rng,
    ) -> MapResult<Self> {
        if route.id != config.route_id {
            return Err(MapError::InvalidConfiguration {
                indicator: config.id.clone(),
                reason: format!("bound to `{}`, not `{}`", config.route_id, route.id),
            });
        }
        if !(config.base_speed > 0.0) {
            return Err(MapError::InvalidConfiguration {
                indicator: config.id.clone(),
                reason: format!("base speed must be positive, got {}", config.base_speed),
            });
        }

        // A missing or zero multiplier means "normal speed".
        let speed_multiplier = if route.speed_multiplier > 0.0 {
            route.speed_multiplier
        } else {
            1.0
        };

        Ok(Self {
            id: config.id.clone(),
            route_id: config.route_id.clone(),
            progress: config.start_offset.rem_euclid(1.0),
            position: Vec2::ZERO,
            angle: 0.0,
            base_speed: config.base_speed,
            speed_multiplier,
            jitter_seed: rng.gen_range(0.0..TAU),
            motion: MotionState::Cruising,
            state_progress: 0.0,
            stop_nodes: route.stop_nodes.clone(),
            current_stop_index: 0,
            stop_duration: 0.0,
            stop_timer: 0.0,
            size: config.size,
            opacity: config.opacity,
        })
    }

    /// Seconds to traverse the whole route at cruising speed.
    pub fn traversal_time(&self) -> f32 {
        self.base_speed / self.speed_multiplier
    }

    /// The stop the indicator is heading for, if any remain this lap.
    pub fn next_stop(&self) -> Option<f32> {
        self.stop_nodes.get(self.current_stop_index).copied()
    }

    /// Multiplier on cruising speed for the current phase.
    pub fn speed_factor(&self, tuning: &MotionTuning) -> f32 {
        match self.motion {
            MotionState::Cruising => {
                1.0 + tuning.jitter_amplitude
                    * (self.jitter_seed + self.progress * tuning.jitter_frequency).sin()
            }
            MotionState::Decelerating => 1.0 - ease_out_cubic(self.state_progress),
            MotionState::Stopped => 0.0,
            MotionState::Accelerating => ease_in_cubic(self.state_progress),
        }
    }

    /// Advance the state machine by `dt` seconds and refresh the derived
    /// position and heading.
    ///
    /// If the route cannot be resolved the indicator is left untouched.
    pub fn step<P: PathQuery + ?Sized>(
        &mut self,
        paths: &P,
        dt: f32,
        tuning: &MotionTuning,
        rng: &mut impl Rng,
    ) -> MapResult<()> {
        let path = paths.resolve(&self.route_id)?;

        self.advance(dt, tuning, rng);

        self.position = path.point_at(self.progress);
        self.angle = path.tangent_angle_at(self.progress);
        Ok(())
    }

    fn advance(&mut self, dt: f32, tuning: &MotionTuning, rng: &mut impl Rng) {
        match self.motion {
            MotionState::Cruising => {
                if let Some(stop) = self.next_stop() {
                    let ahead = stop - self.progress;
                    if ahead > 0.0 && ahead < tuning.decel_zone {
                        self.enter(MotionState::Decelerating);
                        return;
                    }
                }

                self.progress += self.travel(dt, tuning);
                self.wrap();
            }

            MotionState::Decelerating => {
                self.state_progress = (self.state_progress + dt / tuning.decel_duration).min(1.0);

                let moved = self.progress + self.travel(dt, tuning);
                // Never roll past the stop being braked for.
                self.progress = match self.next_stop() {
                    Some(stop) => moved.min(stop),
                    None => moved,
                };

                if self.state_progress >= 1.0 {
                    self.enter(MotionState::Stopped);
                    if let Some(stop) = self.next_stop() {
                        self.progress = stop;
                    }
                    self.stop_duration = if tuning.stop_max > tuning.stop_min {
                        rng.gen_range(tuning.stop_min..tuning.stop_max)
                    } else {
                        tuning.stop_min
                    };
                    self.stop_timer = 0.0;
                }
                self.wrap();
            }

            MotionState::Stopped => {
                self.stop_timer += dt;
                if self.stop_timer >= self.stop_duration {
                    self.enter(MotionState::Accelerating);
                    self.current_stop_index += 1;
                }
            }

            MotionState::Accelerating => {
                self.state_progress = (self.state_progress + dt / tuning.accel_duration).min(1.0);

                self.progress += self.travel(dt, tuning);

                if self.state_progress >= 1.0 {
                    self.enter(MotionState::Cruising);
                    self.jitter_seed = rng.gen_range(0.0..TAU);
                }
                self.wrap();
            }
        }
    }

    /// Progress covered in `dt` at the current speed factor.
    fn travel(&self, dt: f32, tuning: &MotionTuning) -> f32 {
        dt / self.traversal_time() * self.speed_factor(tuning)
    }

    fn enter(&mut self, state: MotionState) {
        self.motion = state;
        self.state_progress = 0.0;
    }

    /// Start a new lap once the end of the route is reached.
    fn wrap(&mut self) {
        if self.progress >= 1.0 {
            self.progress = self.progress.rem_euclid(1.0);
            self.current_stop_index = 0;
        }
    }
}
