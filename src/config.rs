//! Controller configuration components.
//!
//! Movement tuning and sensor geometry. Both are plain components with
//! builder methods, and both deserialize from RON so tuning can live in
//! asset files.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse movement parameters: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid movement parameter `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Tuning for horizontal movement and jumping.
///
/// Immutable for the lifetime of a controller. Speeds are in world units
/// per second, accelerations in world units per second squared and heights
/// in world units.
#[derive(Component, Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[serde(default)]
pub struct MovementParameters {
    /// Top horizontal speed reachable through input.
    pub move_speed: f32,

    /// Horizontal acceleration while input is held.
    pub move_accel: f32,

    /// Acceleration multiplier while airborne (0.0-1.0].
    pub air_control: f32,

    /// Height reached by the initial jump impulse alone.
    pub jump_min_height: f32,

    /// Extra height gained by holding jump for the full extension.
    pub jump_extra_height: f32,

    /// Maximum fall speed while pressed against a wall.
    pub wall_slide_speed: f32,
}

impl Default for MovementParameters {
    fn default() -> Self {
        Self {
            move_speed: 8.0,
            move_accel: 20.0,
            air_control: 0.6,
            jump_min_height: 1.3,
            jump_extra_height: 3.0,
            wall_slide_speed: 2.0,
        }
    }
}

impl MovementParameters {
    /// Parse parameters from a RON document and validate them.
    ///
    /// Missing fields fall back to [`MovementParameters::default`].
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let params: Self = ron::from_str(source)?;
        params.validate()?;
        Ok(params)
    }

    /// Check that every parameter is usable by the controller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("move_speed", self.move_speed),
            ("move_accel", self.move_accel),
            ("jump_min_height", self.jump_min_height),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be positive and finite",
                });
            }
        }

        let non_negative = [
            ("jump_extra_height", self.jump_extra_height),
            ("wall_slide_speed", self.wall_slide_speed),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be non-negative and finite",
                });
            }
        }

        if !(self.air_control > 0.0 && self.air_control <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "air_control",
                reason: "must be in (0, 1]",
            });
        }

        Ok(())
    }

    /// Base vertical speed of a jump under the given gravity magnitude.
    ///
    /// This is exactly the speed needed to reach `jump_min_height`.
    pub fn jump_speed(&self, gravity: f32) -> f32 {
        (2.0 * gravity.abs() * self.jump_min_height).sqrt()
    }

    /// Builder: set movement parameters.
    pub fn with_movement(mut self, move_speed: f32, move_accel: f32) -> Self {
        self.move_speed = move_speed;
        self.move_accel = move_accel;
        self
    }

    /// Builder: set air control multiplier.
    pub fn with_air_control(mut self, air_control: f32) -> Self {
        self.air_control = air_control;
        self
    }

    /// Builder: set jump heights.
    pub fn with_jump_heights(mut self, min_height: f32, extra_height: f32) -> Self {
        self.jump_min_height = min_height;
        self.jump_extra_height = extra_height;
        self
    }

    /// Builder: set wall slide speed.
    pub fn with_wall_slide_speed(mut self, speed: f32) -> Self {
        self.wall_slide_speed = speed;
        self
    }
}

/// Geometry and filtering for the ground/wall probes.
#[derive(Component, Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[serde(default)]
pub struct SensorConfig {
    /// Fraction of the box extent trimmed from each end of a probe.
    ///
    /// Keeps corners of neighbouring tiles from registering as ground or wall.
    pub inset: f32,

    /// Thickness of each probe region, in world units.
    pub probe_thickness: f32,

    /// Collision-group bits identifying ground geometry.
    pub ground_filter: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            inset: 0.03,
            probe_thickness: 0.05,
            ground_filter: u32::MAX,
        }
    }
}

impl SensorConfig {
    /// Builder: set the probe inset fraction.
    pub fn with_inset(mut self, inset: f32) -> Self {
        self.inset = inset;
        self
    }

    /// Builder: set the probe thickness.
    pub fn with_probe_thickness(mut self, thickness: f32) -> Self {
        self.probe_thickness = thickness;
        self
    }

    /// Builder: set the ground collision-group filter.
    pub fn with_ground_filter(mut self, filter: u32) -> Self {
        self.ground_filter = filter;
        self
    }
}
