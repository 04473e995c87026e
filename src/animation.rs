//! Animation parameter projection.
//!
//! Each late tick, controller state and body velocity are turned into a
//! handful of named parameters for whatever animation system the game uses.
//! Nothing here owns state: [`AnimationFrame`] is recomputed from scratch.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::backend::PlatformerPhysicsBackend;
use crate::config::MovementParameters;
use crate::controller::PlatformerController;
use crate::intent::MoveIntent;
use crate::locomotion::direction_of;
use crate::state::CharacterState;
use crate::systems::ControllerActive;

pub const LANDING: &str = "Landing";
pub const RELATIVE_SPEED: &str = "RelativeSpeed";
pub const VERTICAL_SPEED: &str = "VerticalSpeed";
pub const CROUCHING: &str = "Crouching";
pub const AIRBORNE: &str = "Airborne";

/// Vertical speed at which the signal reaches about 0.27 rising or 0.73 falling.
const VERTICAL_SPEED_SCALE: f32 = 8.0;

/// Named animation parameters written by the controller.
///
/// Add this to a character to receive parameters; read them from your own
/// animation systems.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct AnimatorParameters {
    bools: HashMap<String, bool>,
    floats: HashMap<String, f32>,
}

impl AnimatorParameters {
    pub fn set_bool(&mut self, name: &str, value: bool) {
        if let Some(slot) = self.bools.get_mut(name) {
            *slot = value;
        } else {
            self.bools.insert(name.to_owned(), value);
        }
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        if let Some(slot) = self.floats.get_mut(name) {
            *slot = value;
        } else {
            self.floats.insert(name.to_owned(), value);
        }
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.bools.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }
}

/// Logistic compression of vertical speed: fast rise → 0, fast fall → 1.
pub fn vertical_speed_signal(vertical_velocity: f32) -> f32 {
    1.0 / (1.0 + (vertical_velocity / VERTICAL_SPEED_SCALE).exp())
}

/// Parameters derived for one late tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub landing: bool,
    pub relative_speed: f32,
    pub vertical_speed: f32,
    pub crouching: bool,
    pub airborne: bool,
}

impl AnimationFrame {
    pub fn derive(state: &CharacterState, params: &MovementParameters, velocity: Vec2) -> Self {
        let relative_speed = if params.move_speed > 0.0 {
            velocity.x.abs() / params.move_speed
        } else {
            0.0
        };
        Self {
            landing: state.landed,
            relative_speed,
            vertical_speed: vertical_speed_signal(velocity.y),
            crouching: state.crouched,
            airborne: !state.grounded_now,
        }
    }

    pub fn write_to(&self, sink: &mut AnimatorParameters) {
        sink.set_bool(LANDING, self.landing);
        sink.set_float(RELATIVE_SPEED, self.relative_speed);
        sink.set_float(VERTICAL_SPEED, self.vertical_speed);
        sink.set_bool(CROUCHING, self.crouching);
        sink.set_bool(AIRBORNE, self.airborne);
    }
}

/// Flip the x scale so the character faces the input direction.
///
/// Zero input keeps the current facing.
pub fn face_input(transform: &mut Transform, move_axis: f32) {
    let wanted = direction_of(move_axis);
    if wanted == 0.0 {
        return;
    }
    let facing = if transform.scale.x < 0.0 { -1.0 } else { 1.0 };
    if wanted != facing {
        transform.scale.x = -transform.scale.x;
    }
}

/// Write animation parameters and facing for every active controller.
pub fn project_animation<B: PlatformerPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, CharacterState, MovementParameters, f32)> = world
        .query_filtered::<(
            Entity,
            &PlatformerController,
            &MovementParameters,
            Option<&MoveIntent>,
        ), With<ControllerActive>>()
        .iter(world)
        .map(|(e, controller, params, intent)| {
            (
                e,
                controller.state,
                *params,
                intent.map(MoveIntent::axis).unwrap_or(0.0),
            )
        })
        .collect();

    for (entity, state, params, move_axis) in entities {
        let velocity = B::get_velocity(world, entity);
        let frame = AnimationFrame::derive(&state, &params, velocity);

        if let Some(mut sink) = world.get_mut::<AnimatorParameters>(entity) {
            frame.write_to(&mut sink);
        }
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            face_input(&mut transform, move_axis);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_signal_is_centred_and_monotonic() {
        assert!((vertical_speed_signal(0.0) - 0.5).abs() < 1e-6);
        assert!(vertical_speed_signal(40.0) < 0.01);
        assert!(vertical_speed_signal(-40.0) > 0.99);
        assert!(vertical_speed_signal(1.0) < vertical_speed_signal(-1.0));
    }

    #[test]
    fn frame_from_state() {
        let state = CharacterState {
            grounded_now: false,
            crouched: true,
            landed: false,
            ..default()
        };
        let params = MovementParameters::default().with_movement(8.0, 20.0);
        let frame = AnimationFrame::derive(&state, &params, Vec2::new(-4.0, 0.0));

        assert!((frame.relative_speed - 0.5).abs() < 1e-6);
        assert!(frame.airborne);
        assert!(frame.crouching);
        assert!(!frame.landing);
    }

    #[test]
    fn frame_is_written_by_name() {
        let state = CharacterState {
            grounded_now: true,
            grounded_prev: false,
            landed: true,
            ..default()
        };
        let frame = AnimationFrame::derive(&state, &MovementParameters::default(), Vec2::ZERO);
        let mut sink = AnimatorParameters::default();
        frame.write_to(&mut sink);

        assert_eq!(sink.bool(LANDING), Some(true));
        assert_eq!(sink.bool(AIRBORNE), Some(false));
        assert_eq!(sink.float(RELATIVE_SPEED), Some(0.0));
        assert_eq!(sink.float(VERTICAL_SPEED), Some(0.5));
        assert_eq!(sink.float("Unknown"), None);
    }

    #[test]
    fn facing_follows_input() {
        let mut transform = Transform::from_scale(Vec3::new(2.0, 2.0, 1.0));

        face_input(&mut transform, -1.0);
        assert_eq!(transform.scale.x, -2.0);

        // Same direction again keeps it.
        face_input(&mut transform, -0.5);
        assert_eq!(transform.scale.x, -2.0);

        // No input keeps the last facing.
        face_input(&mut transform, 0.0);
        assert_eq!(transform.scale.x, -2.0);

        face_input(&mut transform, 1.0);
        assert_eq!(transform.scale.x, 2.0);
    }
}
