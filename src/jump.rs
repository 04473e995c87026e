//! Buffered jump queue and the jump extension timer.
//!
//! A jump pressed in mid-air is remembered as a single flag and fired on the
//! next landing edge. Variable jump height comes from a cancellable timer
//! during which gravity is suppressed; only one such timer exists per
//! character.

use std::time::Duration;

use bevy::prelude::*;

use crate::config::MovementParameters;
use crate::state::CharacterState;

/// Handle to one jump extension.
///
/// Handles are never reused, so a stale handle can never cancel a newer
/// extension.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JumpHandle(u64);

/// Single-slot cancellable timer for the gravity-free part of a jump.
#[derive(Reflect, Debug, Clone, Default)]
pub struct JumpExtension {
    #[reflect(ignore)]
    slot: Option<(JumpHandle, Timer)>,
    next_generation: u64,
}

impl JumpExtension {
    /// Start a new extension, cancelling any extension still running.
    ///
    /// Durations that are negative, NaN or too large for a [`Duration`]
    /// give an extension that expires on the next tick.
    pub fn start(&mut self, duration_secs: f32) -> JumpHandle {
        let handle = JumpHandle(self.next_generation);
        self.next_generation += 1;
        let duration =
            Duration::try_from_secs_f32(duration_secs.max(0.0)).unwrap_or(Duration::ZERO);
        self.slot = Some((handle, Timer::new(duration, TimerMode::Once)));
        handle
    }

    /// Cancel the running extension, if any. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        self.slot.take().is_some()
    }

    /// Cancel the extension only if `handle` is the one running.
    pub fn cancel_handle(&mut self, handle: JumpHandle) -> bool {
        if self.active_handle() == Some(handle) {
            self.slot = None;
            true
        } else {
            false
        }
    }

    /// Advance the running extension. Returns `true` on the tick it expires.
    pub fn tick(&mut self, delta: Duration) -> bool {
        let Some((_, timer)) = self.slot.as_mut() else {
            return false;
        };
        if timer.tick(delta).finished() {
            self.slot = None;
            true
        } else {
            false
        }
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_some()
    }

    pub fn active_handle(&self) -> Option<JumpHandle> {
        self.slot.as_ref().map(|(handle, _)| *handle)
    }

    /// Seconds left on the running extension.
    pub fn remaining_secs(&self) -> Option<f32> {
        self.slot.as_ref().map(|(_, timer)| timer.remaining_secs())
    }
}

/// What a jump press resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpDecision {
    /// Jump off the ground now.
    Ground,
    /// Kick off the wall now.
    Wall,
    /// Remember the request and fire it on landing.
    Buffered,
}

/// Resolve a jump press against the current contact state.
///
/// A wall jump needs the character to be actually sliding, i.e. falling at
/// least as fast as the wall-slide speed, not merely touching the wall.
pub fn decide_jump(
    state: &CharacterState,
    vertical_velocity: f32,
    params: &MovementParameters,
) -> JumpDecision {
    if state.grounded_now {
        JumpDecision::Ground
    } else if state.wall_contact.is_touching() && vertical_velocity <= -params.wall_slide_speed {
        JumpDecision::Wall
    } else {
        JumpDecision::Buffered
    }
}
