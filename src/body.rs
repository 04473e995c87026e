//! Rigid-body snapshot shared between the controller and the physics backend.
//!
//! A [`BodyState`] is read from the backend at the start of a controller
//! tick, mutated by the controller only, and flushed back at the end. The
//! physics engine owns integration between ticks.

use bevy::prelude::*;

use crate::backend::{ForceMode, PlatformerPhysicsBackend};

/// The controller's view of its rigid body for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    /// Linear velocity at tick start, plus any override made this tick.
    pub velocity: Vec2,
    pub mass: f32,
    pub gravity: Vec2,
    pub gravity_scale: f32,
    force: Vec2,
    impulse: Vec2,
    velocity_overridden: bool,
    gravity_scale_changed: bool,
}

impl Default for BodyState {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 1.0, Vec2::new(0.0, -9.81))
    }
}

impl BodyState {
    pub fn new(velocity: Vec2, mass: f32, gravity: Vec2) -> Self {
        Self {
            velocity,
            mass,
            gravity,
            gravity_scale: 1.0,
            force: Vec2::ZERO,
            impulse: Vec2::ZERO,
            velocity_overridden: false,
            gravity_scale_changed: false,
        }
    }

    /// Snapshot the entity's rigid body through the backend.
    pub fn read<B: PlatformerPhysicsBackend>(world: &World, entity: Entity) -> Self {
        let mass = B::get_mass(world, entity);
        let mut body = Self::new(
            B::get_velocity(world, entity),
            if mass > 0.0 && mass.is_finite() { mass } else { 1.0 },
            B::get_gravity(world, entity),
        );
        body.gravity_scale = B::get_gravity_scale(world, entity);
        body
    }

    /// Write everything the controller changed back through the backend.
    pub fn flush<B: PlatformerPhysicsBackend>(&self, world: &mut World, entity: Entity) {
        if self.velocity_overridden {
            B::set_velocity(world, entity, self.velocity);
        }
        if self.force != Vec2::ZERO {
            B::apply(world, entity, self.force, ForceMode::Force);
        }
        if self.impulse != Vec2::ZERO {
            B::apply(world, entity, self.impulse, ForceMode::Impulse);
        }
        if self.gravity_scale_changed {
            B::set_gravity_scale(world, entity, self.gravity_scale);
        }
    }

    /// Queue a force or impulse for the backend.
    pub fn apply(&mut self, vector: Vec2, mode: ForceMode) {
        match mode {
            ForceMode::Force => self.force += vector,
            ForceMode::Impulse => self.impulse += vector,
        }
    }

    /// Overwrite the vertical velocity.
    pub fn set_vertical_velocity(&mut self, vy: f32) {
        self.velocity.y = vy;
        self.velocity_overridden = true;
    }

    pub fn set_gravity_scale(&mut self, scale: f32) {
        if self.gravity_scale != scale {
            self.gravity_scale = scale;
            self.gravity_scale_changed = true;
        }
    }

    /// Magnitude of gravitational acceleration.
    pub fn gravity_magnitude(&self) -> f32 {
        self.gravity.length()
    }

    /// Force accumulated this tick.
    pub fn pending_force(&self) -> Vec2 {
        self.force
    }

    /// Impulse accumulated this tick.
    pub fn pending_impulse(&self) -> Vec2 {
        self.impulse
    }

    pub fn velocity_overridden(&self) -> bool {
        self.velocity_overridden
    }

    /// Advance the body by `dt` the way a simple integrator would.
    ///
    /// Consumes the pending impulse and force, then applies scaled gravity.
    /// Used by tests and by callers without a physics engine.
    pub fn integrate(&mut self, dt: f32) {
        self.velocity += self.impulse / self.mass;
        self.velocity += self.force / self.mass * dt;
        self.velocity += self.gravity * self.gravity_scale * dt;
        self.force = Vec2::ZERO;
        self.impulse = Vec2::ZERO;
        self.velocity_overridden = false;
        self.gravity_scale_changed = false;
    }
}
