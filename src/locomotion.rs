//! Horizontal movement and jump kinematics.
//!
//! Pure functions over scalar velocities. The controller turns their
//! results into forces and impulses on the [`BodyState`](crate::body::BodyState).

use crate::config::MovementParameters;

/// Horizontal speed that earns one extra unit of jump height.
const BONUS_HEIGHT_SPEED_DIVISOR: f32 = 12.0;

/// Acceleration multiplier when input opposes current velocity.
const REVERSAL_MULTIPLIER: f32 = 2.0;

/// Deceleration multiplier when grounded with no input.
const BRAKING_MULTIPLIER: f32 = 1.5;

/// Sign of `value`, with zero mapping to zero.
///
/// Unlike `f32::signum`, `direction_of(0.0)` is `0.0`.
#[inline]
pub fn direction_of(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Velocity change along x for one fixed tick.
///
/// `move_input` must already have crouch suppression applied. The caller
/// converts the result into a force of `delta / dt * mass`.
pub fn horizontal_velocity_change(
    velocity: f32,
    move_input: f32,
    grounded: bool,
    params: &MovementParameters,
    dt: f32,
) -> f32 {
    let dir = direction_of(move_input);
    let speed_along = dir * velocity;
    let mut delta = params.move_accel * dt;

    if dir != 0.0 {
        if speed_along > params.move_speed {
            return 0.0;
        }
        if !grounded {
            delta *= params.air_control;
        }
        if speed_along < 0.0 {
            delta *= REVERSAL_MULTIPLIER;
        }
        if speed_along + delta > params.move_speed {
            delta = params.move_speed - speed_along;
        }
        dir * delta
    } else if grounded && velocity != 0.0 {
        let speed = velocity.abs();
        delta = (delta * BRAKING_MULTIPLIER).min(speed);
        -direction_of(velocity) * delta
    } else {
        0.0
    }
}

/// Vertical velocity after the wall-slide cap, or `None` if unchanged.
pub fn wall_slide_clamp(vertical_velocity: f32, wall_slide_speed: f32) -> Option<f32> {
    (vertical_velocity < -wall_slide_speed).then_some(-wall_slide_speed)
}

/// Extra jump height granted for horizontal speed at takeoff.
pub fn bonus_height(horizontal_velocity: f32) -> f32 {
    horizontal_velocity.abs() / BONUS_HEIGHT_SPEED_DIVISOR
}

/// Gravity-free extension time of a ground jump.
///
/// Zero when there is no jump speed, e.g. without gravity.
pub fn ground_extension_time(
    params: &MovementParameters,
    jump_speed: f32,
    horizontal_velocity: f32,
) -> f32 {
    if jump_speed <= 0.0 {
        return 0.0;
    }
    (params.jump_extra_height + bonus_height(horizontal_velocity)) / jump_speed
}

/// Gravity-free extension time of a wall jump, half a plain ground jump.
pub fn wall_extension_time(params: &MovementParameters, jump_speed: f32) -> f32 {
    if jump_speed <= 0.0 {
        return 0.0;
    }
    0.5 * params.jump_extra_height / jump_speed
}
