//! Input intents and events consumed by the controller.
//!
//! Horizontal movement is a polled axis stored on the character
//! ([`MoveIntent`]). Buttons arrive as discrete press/release
//! [`ControlEvent`]s addressed to a character entity; any input source
//! (keyboard, gamepad, AI, replay) can write them.

use bevy::prelude::*;

/// Polled horizontal movement input.
///
/// # Example
///
/// ```rust
/// use platformer_controller::prelude::*;
///
/// let mut intent = MoveIntent::default();
/// intent.set_axis(3.0);
/// assert_eq!(intent.axis(), 1.0);
/// assert!(intent.is_moving());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct MoveIntent {
    axis: f32,
}

impl MoveIntent {
    pub fn new(axis: f32) -> Self {
        let mut intent = Self::default();
        intent.set_axis(axis);
        intent
    }

    /// Set the axis value, clamped to `[-1, 1]`. NaN maps to zero.
    pub fn set_axis(&mut self, axis: f32) {
        self.axis = if axis.is_nan() {
            0.0
        } else {
            axis.clamp(-1.0, 1.0)
        };
    }

    #[inline]
    pub fn axis(&self) -> f32 {
        self.axis
    }

    pub fn is_moving(&self) -> bool {
        self.axis != 0.0
    }

    pub fn clear(&mut self) {
        self.axis = 0.0;
    }
}

/// Discrete actions delivered as press/release events.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Jump,
    Crouch,
    /// Toggles the character's special flag on press.
    Special,
    /// Requests a scene reload on press.
    Restart,
}

#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlPhase {
    Pressed,
    Released,
}

/// A button press or release for one character.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub entity: Entity,
    pub action: ControlAction,
    pub phase: ControlPhase,
}

impl ControlEvent {
    pub fn pressed(entity: Entity, action: ControlAction) -> Self {
        Self {
            entity,
            action,
            phase: ControlPhase::Pressed,
        }
    }

    pub fn released(entity: Entity, action: ControlAction) -> Self {
        Self {
            entity,
            action,
            phase: ControlPhase::Released,
        }
    }
}

/// The physics engine reported a new contact for a character's body.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyContactStarted {
    pub entity: Entity,
    pub other: Entity,
}

/// A character asked for the current scene to be reloaded.
///
/// The controller only emits this; the game decides how to reload.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSceneRequested {
    pub requested_by: Entity,
}
