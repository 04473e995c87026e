//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the platformer controller. The controller never integrates
//! motion itself: it reads the rigid body, decides on forces, impulses and
//! gravity scale, and hands them back through this trait.

use bevy::prelude::*;

/// How a vector handed to [`PlatformerPhysicsBackend::apply`] is interpreted.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForceMode {
    /// Continuous force, integrated over the physics timestep.
    #[default]
    Force,
    /// Instantaneous change in momentum.
    Impulse,
}

/// Trait for physics backend implementations.
///
/// Implement this trait to drive the controller with a physics engine.
/// The backend also provides a plugin that installs its sensor system
/// (overlap queries for ground and wall contact) and any force bookkeeping
/// the engine needs.
///
/// For an example implementation, see the `rapier` module's `Rapier2dBackend`.
pub trait PlatformerPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Whether the entity carries a rigid body this backend can drive.
    fn has_rigid_body(world: &World, entity: Entity) -> bool;

    /// World-space axis-aligned bounding box of the entity's collider.
    ///
    /// Returns `None` if the entity has no collider shape the backend can
    /// measure. A controller without a bounding box is never activated.
    fn get_bounds(world: &World, entity: Entity) -> Option<Rect>;

    /// Get the current velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Set the velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Apply an impulse to an entity.
    ///
    /// Impulse is an instantaneous change in momentum (velocity * mass).
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2);

    /// Apply a force to an entity.
    ///
    /// Force is applied over the physics timestep.
    fn apply_force(world: &mut World, entity: Entity, force: Vec2);

    /// Apply a vector with the given [`ForceMode`].
    fn apply(world: &mut World, entity: Entity, vector: Vec2, mode: ForceMode) {
        match mode {
            ForceMode::Force => Self::apply_force(world, entity, vector),
            ForceMode::Impulse => Self::apply_impulse(world, entity, vector),
        }
    }

    /// Get the multiplier applied to gravity for this entity.
    fn get_gravity_scale(world: &World, entity: Entity) -> f32;

    /// Set the multiplier applied to gravity for this entity.
    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32);

    /// Get the gravity vector for an entity.
    ///
    /// Default implementation returns standard earth gravity in world units.
    fn get_gravity(_world: &World, _entity: Entity) -> Vec2 {
        Vec2::new(0.0, -9.81)
    }

    /// Get the mass of an entity.
    fn get_mass(_world: &World, _entity: Entity) -> f32 {
        // Default implementation returns 1.0 (no scaling)
        1.0
    }

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
