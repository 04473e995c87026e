//! The locomotion and jump controller.
//!
//! [`PlatformerController`] is the central hub for a character: it owns the
//! [`CharacterState`], the jump extension timer and the bookkeeping that
//! pairs jump presses with the jumps they started. All physical effects go
//! through a [`BodyState`] passed in by the caller, which keeps the
//! controller testable without any physics engine.

use std::time::Duration;

use bevy::prelude::*;

use crate::backend::ForceMode;
use crate::body::BodyState;
use crate::config::{MovementParameters, SensorConfig};
use crate::intent::MoveIntent;
use crate::jump::{decide_jump, JumpDecision, JumpExtension, JumpHandle};
use crate::locomotion::{
    ground_extension_time, horizontal_velocity_change, wall_extension_time, wall_slide_clamp,
};
use crate::sensor::ContactFacts;
use crate::state::{CharacterState, JumpPhase, WallContact};

/// Fraction of base jump speed below which a new contact during the
/// extension counts as hitting something overhead.
const HEAD_BUMP_SPEED_FRACTION: f32 = 0.2;

/// Kind of jump that was fired.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Ground,
    Wall,
}

/// Outcome of a jump press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    Fired(JumpKind),
    Buffered,
}

/// Core character controller component.
///
/// Inserting it pulls in default [`MovementParameters`], [`SensorConfig`],
/// [`MoveIntent`] and [`ContactFacts`]. The controller stays inert until
/// the attach system has validated the entity's rigid body and collider.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
#[require(MovementParameters, SensorConfig, MoveIntent, ContactFacts)]
pub struct PlatformerController {
    pub state: CharacterState,
    extension: JumpExtension,
    /// Extension started by the jump press that is still held.
    held_jump: Option<JumpHandle>,
    jump_held: bool,
}

impl PlatformerController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this tick's contact facts.
    ///
    /// Shifts `grounded_now` into `grounded_prev`, so it must run exactly
    /// once per logic tick. Returns `true` on the landing edge.
    pub fn update_contacts(&mut self, facts: ContactFacts) -> bool {
        self.state.grounded_prev = self.state.grounded_now;
        self.state.grounded_now = facts.grounded;
        self.state.wall_contact = if facts.grounded {
            WallContact::None
        } else {
            facts.wall
        };
        self.state.landed = self.state.is_landing_edge();
        self.state.landed
    }

    /// Fire the buffered jump if this tick is the landing edge.
    ///
    /// Must run after [`update_contacts`](Self::update_contacts) and before
    /// any input of the same tick is processed.
    pub fn resolve_landing(
        &mut self,
        body: &mut BodyState,
        params: &MovementParameters,
    ) -> Option<JumpKind> {
        if !self.state.landed || !self.state.pending_landing_jump {
            return None;
        }
        self.state.pending_landing_jump = false;
        debug!("Landed with buffered jump, firing");
        let handle = self.ground_jump(body, params);
        if self.jump_held {
            self.held_jump = Some(handle);
        }
        Some(JumpKind::Ground)
    }

    /// Handle a jump press.
    pub fn press_jump(&mut self, body: &mut BodyState, params: &MovementParameters) -> JumpOutcome {
        self.jump_held = true;
        match decide_jump(&self.state, body.velocity.y, params) {
            JumpDecision::Ground => {
                self.held_jump = Some(self.ground_jump(body, params));
                JumpOutcome::Fired(JumpKind::Ground)
            }
            JumpDecision::Wall => {
                self.held_jump = Some(self.wall_jump(body, params));
                JumpOutcome::Fired(JumpKind::Wall)
            }
            JumpDecision::Buffered => {
                // `held_jump` still names the running extension, if any, so
                // releasing this press ends it.
                if !self.state.pending_landing_jump {
                    debug!("Jump requested in the air, waiting for landing");
                }
                self.state.pending_landing_jump = true;
                JumpOutcome::Buffered
            }
        }
    }

    /// Handle a jump release.
    ///
    /// Drops a buffered request and cuts short the extension started by the
    /// press being released. Returns whether an extension was cancelled.
    pub fn release_jump(&mut self, body: &mut BodyState) -> bool {
        self.jump_held = false;
        self.state.pending_landing_jump = false;
        let Some(handle) = self.held_jump.take() else {
            return false;
        };
        if self.extension.cancel_handle(handle) {
            body.set_gravity_scale(1.0);
            debug!("Jump released early, extension cancelled");
            true
        } else {
            false
        }
    }

    pub fn press_crouch(&mut self) {
        self.state.crouched = true;
    }

    pub fn release_crouch(&mut self) {
        self.state.crouched = false;
    }

    /// Flip the special toggle. Returns the new value.
    pub fn toggle_special(&mut self) -> bool {
        self.state.special = !self.state.special;
        self.state.special
    }

    /// React to the physics engine reporting a new contact.
    ///
    /// During the extension, a contact while rising slower than a fifth of
    /// the base jump speed means the head hit something. Returns whether the
    /// extension was cancelled.
    pub fn contact_began(&mut self, body: &mut BodyState, params: &MovementParameters) -> bool {
        if body.gravity_scale != 0.0 || !self.extension.is_active() {
            return false;
        }
        let jump_speed = params.jump_speed(body.gravity_magnitude());
        if body.velocity.y >= HEAD_BUMP_SPEED_FRACTION * jump_speed {
            return false;
        }
        self.extension.cancel();
        self.held_jump = None;
        body.set_gravity_scale(1.0);
        debug!("Head bump, extension cancelled");
        true
    }

    /// Fixed-step update: horizontal force, wall-slide cap and timer.
    pub fn fixed_tick(
        &mut self,
        body: &mut BodyState,
        params: &MovementParameters,
        move_axis: f32,
        dt: f32,
    ) {
        if dt <= 0.0 {
            return;
        }
        let grounded = self.state.grounded_now;
        let input = self.state.effective_move_input(move_axis);

        let delta = horizontal_velocity_change(body.velocity.x, input, grounded, params, dt);
        if delta != 0.0 {
            body.apply(Vec2::X * (delta / dt * body.mass), ForceMode::Force);
        }

        if self.state.wall_contact.is_touching() {
            if let Some(vy) = wall_slide_clamp(body.velocity.y, params.wall_slide_speed) {
                body.set_vertical_velocity(vy);
            }
        }

        if self.extension.tick(Duration::from_secs_f32(dt)) {
            self.held_jump = None;
            body.set_gravity_scale(1.0);
            debug!("Jump extension finished");
        }
    }

    /// Current phase of the jump state machine.
    pub fn phase(&self) -> JumpPhase {
        if self.extension.is_active() {
            JumpPhase::Extending
        } else if self.state.grounded_now {
            JumpPhase::Grounded
        } else if self.state.wall_contact.is_touching() {
            JumpPhase::AirborneWallSliding
        } else {
            JumpPhase::AirborneFree
        }
    }

    pub fn is_extending(&self) -> bool {
        self.extension.is_active()
    }

    pub fn extension(&self) -> &JumpExtension {
        &self.extension
    }

    fn ground_jump(&mut self, body: &mut BodyState, params: &MovementParameters) -> JumpHandle {
        let jump_speed = params.jump_speed(body.gravity_magnitude());
        body.apply(Vec2::Y * (jump_speed * body.mass), ForceMode::Impulse);
        let duration = ground_extension_time(params, jump_speed, body.velocity.x);
        debug!("Ground jump: speed={jump_speed:.2}, extension={duration:.3}s");
        self.begin_extension(body, duration)
    }

    fn wall_jump(&mut self, body: &mut BodyState, params: &MovementParameters) -> JumpHandle {
        let jump_speed = params.jump_speed(body.gravity_magnitude());
        let away = -self.state.wall_contact.sign();
        let impulse = Vec2::new(
            away * params.move_speed,
            jump_speed - body.velocity.y,
        ) * body.mass;
        body.apply(impulse, ForceMode::Impulse);
        let duration = wall_extension_time(params, jump_speed);
        debug!(
            "Wall jump off {:?}: extension={duration:.3}s",
            self.state.wall_contact
        );
        self.begin_extension(body, duration)
    }

    fn begin_extension(&mut self, body: &mut BodyState, duration: f32) -> JumpHandle {
        body.set_gravity_scale(0.0);
        self.extension.start(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.02;

    fn params() -> MovementParameters {
        MovementParameters::default()
    }

    fn body() -> BodyState {
        BodyState::new(Vec2::ZERO, 1.0, Vec2::new(0.0, -10.0))
    }

    fn grounded() -> ContactFacts {
        ContactFacts {
            grounded: true,
            wall: WallContact::None,
        }
    }

    fn airborne() -> ContactFacts {
        ContactFacts::default()
    }

    fn landed_controller() -> PlatformerController {
        let mut controller = PlatformerController::new();
        controller.update_contacts(grounded());
        controller.update_contacts(grounded());
        controller
    }

    #[test]
    fn one_tick_from_rest_reaches_point_four() {
        let mut controller = landed_controller();
        let mut body = body();
        let p = MovementParameters::default().with_movement(8.0, 20.0);

        controller.fixed_tick(&mut body, &p, 1.0, DT);
        body.set_gravity_scale(0.0);
        body.integrate(DT);

        assert!((body.velocity.x - 0.4).abs() < 1e-5);
    }

    #[test]
    fn at_cap_no_force_is_applied() {
        let mut controller = landed_controller();
        let mut body = body();
        body.velocity.x = 8.0;

        controller.fixed_tick(&mut body, &params(), 1.0, DT);
        assert_eq!(body.pending_force(), Vec2::ZERO);
    }

    #[test]
    fn force_scales_with_mass() {
        let mut controller = landed_controller();
        let mut body = BodyState::new(Vec2::ZERO, 3.0, Vec2::new(0.0, -10.0));

        controller.fixed_tick(&mut body, &params(), -1.0, DT);
        // 0.4 velocity change over 0.02s on a 3kg body.
        assert!((body.pending_force().x + 0.4 / DT * 3.0).abs() < 1e-3);
    }

    #[test]
    fn crouching_on_ground_brakes_instead_of_moving() {
        let mut controller = landed_controller();
        controller.press_crouch();
        let mut body = body();
        body.velocity.x = 2.0;

        controller.fixed_tick(&mut body, &params(), 1.0, DT);
        assert!(body.pending_force().x < 0.0);

        controller.release_crouch();
        let mut body = self::body();
        controller.fixed_tick(&mut body, &params(), 1.0, DT);
        assert!(body.pending_force().x > 0.0);
    }

    #[test]
    fn landing_edge_fires_once_per_transition() {
        let mut controller = PlatformerController::new();
        let sequence = [
            (airborne(), false),
            (airborne(), false),
            (grounded(), true),
            (grounded(), false),
            (grounded(), false),
            (airborne(), false),
            (grounded(), true),
        ];
        for (i, (facts, expected)) in sequence.into_iter().enumerate() {
            assert_eq!(controller.update_contacts(facts), expected, "tick {i}");
        }
    }

    #[test]
    fn grounded_jump_applies_impulse_and_suppresses_gravity() {
        let mut controller = landed_controller();
        let mut body = body();
        let p = params();

        let outcome = controller.press_jump(&mut body, &p);

        assert_eq!(outcome, JumpOutcome::Fired(JumpKind::Ground));
        let expected = p.jump_speed(10.0);
        assert!((body.pending_impulse().y - expected).abs() < 1e-5);
        assert_eq!(body.gravity_scale, 0.0);
        assert_eq!(controller.phase(), JumpPhase::Extending);
    }

    #[test]
    fn extension_duration_includes_speed_bonus() {
        let mut controller = landed_controller();
        let mut body = body();
        body.velocity.x = 6.0;
        let p = params();

        controller.press_jump(&mut body, &p);

        let jump_speed = p.jump_speed(10.0);
        let expected = (p.jump_extra_height + 0.5) / jump_speed;
        let remaining = controller.extension().remaining_secs().unwrap();
        assert!((remaining - expected).abs() < 1e-3);
    }

    #[test]
    fn airborne_press_buffers_without_moving() {
        let mut controller = PlatformerController::new();
        controller.update_contacts(airborne());
        let mut body = body();

        let outcome = controller.press_jump(&mut body, &params());

        assert_eq!(outcome, JumpOutcome::Buffered);
        assert!(controller.state.pending_landing_jump);
        assert_eq!(body.pending_impulse(), Vec2::ZERO);
        assert_eq!(body.gravity_scale, 1.0);
    }

    #[test]
    fn buffered_jump_fires_on_landing_exactly_once() {
        let mut controller = PlatformerController::new();
        controller.update_contacts(airborne());
        let p = params();

        // Repeated presses before landing must not stack.
        for _ in 0..3 {
            let mut body = body();
            controller.press_jump(&mut body, &p);
        }

        let mut body = body();
        controller.update_contacts(grounded());
        assert_eq!(controller.resolve_landing(&mut body, &p), Some(JumpKind::Ground));
        assert!(body.pending_impulse().y > 0.0);
        assert_eq!(body.gravity_scale, 0.0);
        assert!(!controller.state.pending_landing_jump);

        // Still grounded next tick: no second jump.
        let mut body = self::body();
        controller.update_contacts(grounded());
        assert_eq!(controller.resolve_landing(&mut body, &p), None);
        assert_eq!(body.pending_impulse(), Vec2::ZERO);
    }

    #[test]
    fn release_before_landing_drops_buffered_jump() {
        let mut controller = PlatformerController::new();
        controller.update_contacts(airborne());
        let p = params();
        let mut body = body();

        controller.press_jump(&mut body, &p);
        controller.release_jump(&mut body);

        controller.update_contacts(grounded());
        assert_eq!(controller.resolve_landing(&mut body, &p), None);
    }

    #[test]
    fn release_cuts_extension_and_restores_gravity() {
        let mut controller = landed_controller();
        let mut body = body();
        let p = params();

        controller.press_jump(&mut body, &p);
        assert!(controller.release_jump(&mut body));
        assert_eq!(body.gravity_scale, 1.0);
        assert!(!controller.is_extending());

        // Second release is a no-op.
        assert!(!controller.release_jump(&mut body));
    }

    #[test]
    fn release_after_landing_jump_cuts_that_jump() {
        let mut controller = PlatformerController::new();
        controller.update_contacts(airborne());
        let p = params();
        let mut body = body();

        controller.press_jump(&mut body, &p);
        controller.update_contacts(grounded());
        controller.resolve_landing(&mut body, &p);
        assert!(controller.is_extending());

        assert!(controller.release_jump(&mut body));
        assert_eq!(body.gravity_scale, 1.0);
    }

    #[test]
    fn repeated_press_mid_jump_keeps_release_pairing() {
        let mut controller = landed_controller();
        let p = params();
        let mut body = body();

        controller.press_jump(&mut body, &p);
        controller.update_contacts(airborne());
        assert!(controller.is_extending());

        // A second key on the same action while rising only buffers.
        assert_eq!(controller.press_jump(&mut body, &p), JumpOutcome::Buffered);
        assert!(controller.is_extending());

        assert!(controller.release_jump(&mut body));
        assert!(!controller.is_extending());
        assert!(!controller.state.pending_landing_jump);
        assert_eq!(body.gravity_scale, 1.0);
    }

    #[test]
    fn release_after_expiry_leaves_next_jump_alone() {
        let mut controller = landed_controller();
        let p = params();
        let mut body = body();

        // First jump runs to completion while held.
        controller.press_jump(&mut body, &p);
        for _ in 0..200 {
            controller.fixed_tick(&mut body, &p, 0.0, DT);
        }
        assert!(!controller.is_extending());
        assert_eq!(body.gravity_scale, 1.0);
        assert!(!controller.release_jump(&mut body));

        // New press, new jump; its own release cuts it.
        controller.press_jump(&mut body, &p);
        assert!(controller.is_extending());
        assert!(controller.release_jump(&mut body));
        assert!(!controller.is_extending());
        assert!(!controller.release_jump(&mut body));
    }

    #[test]
    fn jump_without_gravity_does_not_panic() {
        let mut controller = landed_controller();
        let p = params();
        let mut body = BodyState::new(Vec2::ZERO, 1.0, Vec2::ZERO);

        assert_eq!(
            controller.press_jump(&mut body, &p),
            JumpOutcome::Fired(JumpKind::Ground)
        );
        assert_eq!(body.pending_impulse(), Vec2::ZERO);

        controller.fixed_tick(&mut body, &p, 0.0, DT);
        assert!(!controller.is_extending());
        assert_eq!(body.gravity_scale, 1.0);
    }

    #[test]
    fn second_jump_replaces_first_extension() {
        let mut controller = landed_controller();
        let p = params();
        let mut body = body();

        controller.press_jump(&mut body, &p);
        let first = controller.extension().active_handle();
        controller.press_jump(&mut body, &p);
        let second = controller.extension().active_handle();

        assert!(first.is_some() && second.is_some());
        assert_ne!(first, second);
        assert_eq!(body.gravity_scale, 0.0);
    }

    #[test]
    fn gravity_stays_suppressed_for_whole_extension() {
        let mut controller = landed_controller();
        let p = params().with_jump_heights(1.25, 1.0);
        let mut body = body();

        controller.press_jump(&mut body, &p);
        // jump_speed = sqrt(2 * 10 * 1.25) = 5, extension = 1 / 5 = 0.2s.
        for _ in 0..9 {
            controller.fixed_tick(&mut body, &p, 0.0, DT);
            assert_eq!(body.gravity_scale, 0.0);
        }
        for _ in 0..3 {
            controller.fixed_tick(&mut body, &p, 0.0, DT);
        }
        assert_eq!(body.gravity_scale, 1.0);
        assert_eq!(controller.phase(), JumpPhase::Grounded);
    }

    #[test]
    fn wall_slide_caps_fall_speed_exactly() {
        let mut controller = PlatformerController::new();
        controller.update_contacts(ContactFacts {
            grounded: false,
            wall: WallContact::Left,
        });
        let p = params().with_wall_slide_speed(2.0);
        let mut body = body();
        body.velocity.y = -9.0;

        controller.fixed_tick(&mut body, &p, -1.0, DT);

        assert_eq!(body.velocity.y, -2.0);
        assert!(body.velocity_overridden());
        assert_eq!(controller.phase(), JumpPhase::AirborneWallSliding);
    }

    #[test]
    fn wall_slide_leaves_upward_motion_alone() {
        let mut controller = PlatformerController::new();
        controller.update_contacts(ContactFacts {
            grounded: false,
            wall: WallContact::Right,
        });
        let mut body = body();
        body.velocity.y = 4.0;

        controller.fixed_tick(&mut body, &params(), 1.0, DT);

        assert_eq!(body.velocity.y, 4.0);
        assert!(!body.velocity_overridden());
    }

    #[test]
    fn wall_jump_pushes_away_and_resets_vertical_speed() {
        let mut controller = PlatformerController::new();
        controller.update_contacts(ContactFacts {
            grounded: false,
            wall: WallContact::Right,
        });
        let p = params();
        let mut body = body();
        body.velocity.y = -p.wall_slide_speed;

        let outcome = controller.press_jump(&mut body, &p);

        assert_eq!(outcome, JumpOutcome::Fired(JumpKind::Wall));
        let jump_speed = p.jump_speed(10.0);
        let impulse = body.pending_impulse();
        assert!((impulse.x + p.move_speed).abs() < 1e-5);
        assert!((body.velocity.y + impulse.y - jump_speed).abs() < 1e-5);
        let remaining = controller.extension().remaining_secs().unwrap();
        assert!((remaining - 0.5 * p.jump_extra_height / jump_speed).abs() < 1e-3);
    }

    #[test]
    fn head_bump_cancels_extension() {
        let mut controller = landed_controller();
        let p = params();
        let mut body = body();
        controller.press_jump(&mut body, &p);
        body.integrate(DT);
        controller.update_contacts(airborne());

        // Rising at full jump speed: a side contact is not a head bump.
        assert!(!controller.contact_began(&mut body, &p));
        assert!(controller.is_extending());

        // Ceiling killed the upward speed.
        body.velocity.y = 0.0;
        assert!(controller.contact_began(&mut body, &p));
        assert!(!controller.is_extending());
        assert_eq!(body.gravity_scale, 1.0);
    }

    #[test]
    fn contact_without_extension_is_ignored() {
        let mut controller = landed_controller();
        let mut body = body();
        assert!(!controller.contact_began(&mut body, &params()));
        assert_eq!(body.gravity_scale, 1.0);
    }

    #[test]
    fn landing_clears_wall_contact() {
        let mut controller = PlatformerController::new();
        controller.update_contacts(ContactFacts {
            grounded: false,
            wall: WallContact::Left,
        });
        controller.update_contacts(ContactFacts {
            grounded: true,
            wall: WallContact::Left,
        });
        assert_eq!(controller.state.wall_contact, WallContact::None);
    }

    #[test]
    fn special_toggles() {
        let mut controller = PlatformerController::new();
        assert!(controller.toggle_special());
        assert!(!controller.toggle_special());
    }
}
