//! Character state and state marker components.
//!
//! [`CharacterState`] is the controller's own record of ground and wall
//! contact and pending requests. The marker components mirror it for
//! convenient querying and are added/removed automatically.

use bevy::prelude::*;

/// Side of the wall the character is pressed against while airborne.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WallContact {
    Left,
    #[default]
    None,
    Right,
}

impl WallContact {
    /// Contact on the side a horizontal input points to.
    pub fn from_direction(direction: f32) -> Self {
        if direction < 0.0 {
            WallContact::Left
        } else if direction > 0.0 {
            WallContact::Right
        } else {
            WallContact::None
        }
    }

    /// Signed side of the wall: -1 left, 0 none, +1 right.
    pub fn sign(self) -> f32 {
        match self {
            WallContact::Left => -1.0,
            WallContact::None => 0.0,
            WallContact::Right => 1.0,
        }
    }

    pub fn is_touching(self) -> bool {
        self != WallContact::None
    }
}

/// Per-tick state owned by the controller.
///
/// A fresh state counts as grounded on both ticks, so a character spawned
/// on the ground does not report a landing.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct CharacterState {
    /// Grounded this tick.
    pub grounded_now: bool,
    /// Grounded on the previous tick.
    pub grounded_prev: bool,
    /// Crouch input is held.
    pub crouched: bool,
    /// Wall being pressed against while airborne.
    pub wall_contact: WallContact,
    /// A jump was requested in the air and waits for the landing edge.
    pub pending_landing_jump: bool,
    /// Toggled by each press of the special action.
    pub special: bool,
    /// The landing edge was detected on the current logic tick.
    pub landed: bool,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self {
            grounded_now: true,
            grounded_prev: true,
            crouched: false,
            wall_contact: WallContact::None,
            pending_landing_jump: false,
            special: false,
            landed: false,
        }
    }
}

impl CharacterState {
    /// True exactly on the tick where grounded goes from false to true.
    pub fn is_landing_edge(&self) -> bool {
        !self.grounded_prev && self.grounded_now
    }

    /// Horizontal input after crouch suppression.
    pub fn effective_move_input(&self, move_axis: f32) -> f32 {
        if self.crouched && self.grounded_now {
            0.0
        } else {
            move_axis
        }
    }
}

/// Coarse phase of the jump state machine, derived from controller state.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpPhase {
    Grounded,
    AirborneFree,
    AirborneWallSliding,
    /// Gravity is suppressed while the jump extension runs.
    Extending,
}

/// Marker component indicating the character is grounded.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the character is sliding down a wall.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct TouchingWall {
    /// Side of the wall.
    pub side: WallContact,
}

impl Default for TouchingWall {
    fn default() -> Self {
        Self {
            side: WallContact::Right,
        }
    }
}

impl TouchingWall {
    pub fn new(side: WallContact) -> Self {
        Self { side }
    }

    /// Check if the wall is on the left side.
    pub fn is_left(&self) -> bool {
        self.side == WallContact::Left
    }

    /// Check if the wall is on the right side.
    pub fn is_right(&self) -> bool {
        self.side == WallContact::Right
    }
}
