//! Keyboard input adapter.
//!
//! ## Controls
//! - **A/D** or **Left/Right**: Move horizontally
//! - **Space** or **W**: Jump (hold for a higher jump)
//! - **S/Down** (hold): Crouch
//! - **E**: Toggle special
//! - **R**: Restart the scene

use bevy::prelude::*;

use crate::intent::{ControlAction, ControlEvent, MoveIntent};
use crate::PlatformerSet;

/// Marker component for entities driven by the keyboard.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct PlayerControlled;

/// Plugin that turns keyboard state into controller input for
/// [`PlayerControlled`] entities.
///
/// Requires `ButtonInput<KeyCode>` (provided by `DefaultPlugins`).
pub struct KeyboardControlsPlugin;

impl Plugin for KeyboardControlsPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<PlayerControlled>();
        app.add_systems(
            Update,
            handle_keyboard_input.before(PlatformerSet::Sensors),
        );
    }
}

const JUMP_KEYS: [KeyCode; 2] = [KeyCode::Space, KeyCode::KeyW];
const CROUCH_KEYS: [KeyCode; 2] = [KeyCode::KeyS, KeyCode::ArrowDown];
const SPECIAL_KEYS: [KeyCode; 1] = [KeyCode::KeyE];
const RESTART_KEYS: [KeyCode; 1] = [KeyCode::KeyR];

/// Horizontal axis from the held movement keys.
pub fn horizontal_axis(keyboard: &ButtonInput<KeyCode>) -> f32 {
    let mut horizontal = 0.0;
    if keyboard.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        horizontal -= 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        horizontal += 1.0;
    }
    horizontal
}

/// Press/release events for this frame, in a fixed action order.
pub fn button_events(keyboard: &ButtonInput<KeyCode>, entity: Entity) -> Vec<ControlEvent> {
    let bindings: [(ControlAction, &[KeyCode]); 4] = [
        (ControlAction::Jump, &JUMP_KEYS),
        (ControlAction::Crouch, &CROUCH_KEYS),
        (ControlAction::Special, &SPECIAL_KEYS),
        (ControlAction::Restart, &RESTART_KEYS),
    ];

    let mut events = Vec::new();
    for (action, keys) in bindings {
        let keys = keys.iter().copied();
        if keyboard.any_just_pressed(keys.clone()) {
            events.push(ControlEvent::pressed(entity, action));
        }
        // Release only once the last bound key is up.
        if keyboard.any_just_released(keys.clone()) && !keyboard.any_pressed(keys) {
            events.push(ControlEvent::released(entity, action));
        }
    }
    events
}

/// Updates `MoveIntent` and writes `ControlEvent`s for keyboard-driven
/// characters.
fn handle_keyboard_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut query: Query<(Entity, &mut MoveIntent), With<PlayerControlled>>,
    mut controls: EventWriter<ControlEvent>,
) {
    let horizontal = horizontal_axis(&keyboard);
    for (entity, mut intent) in &mut query {
        if intent.axis() != horizontal {
            intent.set_axis(horizontal);
        }
        controls.write_batch(button_events(&keyboard, entity));
    }
}
