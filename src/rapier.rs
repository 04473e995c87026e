//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.
//!
//! Add Rapier with `in_fixed_schedule()` so that forces accumulated in
//! `FixedUpdate` are integrated by the following physics step.

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::PlatformerPhysicsBackend;
use crate::config::SensorConfig;
use crate::controller::PlatformerController;
use crate::intent::{BodyContactStarted, MoveIntent};
use crate::sensor::{sense_contacts, ContactFacts};
use crate::systems::ControllerActive;
use crate::PlatformerSet;

/// Rapier2D physics backend for the platformer controller.
///
/// This backend uses `bevy_rapier2d` for physics operations including
/// force application and velocity manipulation. Ground and wall sensing
/// (shape intersection queries) is handled by a dedicated Rapier system
/// that receives `RapierContext` as a system parameter.
pub struct Rapier2dBackend;

impl PlatformerPhysicsBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn has_rigid_body(world: &World, entity: Entity) -> bool {
        world.get::<RigidBody>(entity).is_some()
    }

    fn get_bounds(world: &World, entity: Entity) -> Option<Rect> {
        let collider = world.get::<Collider>(entity)?;
        let center = world
            .get::<GlobalTransform>(entity)
            .map(|t| t.translation().xy())
            .or_else(|| world.get::<Transform>(entity).map(|t| t.translation.xy()))?;
        collider_bounds(collider, center)
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.impulse += impulse;
        } else {
            // Fallback: apply as velocity change if no ExternalImpulse component
            let mass = Self::get_mass(world, entity);
            if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
                vel.linvel += impulse / mass;
            }
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec2) {
        // Accumulate instead of directly modifying ExternalForce.
        // Forces reach ExternalForce in apply_controller_forces.
        if let Some(mut forces) = world.get_mut::<ControllerForces>(entity) {
            forces.add(force);
        }
    }

    fn get_gravity_scale(world: &World, entity: Entity) -> f32 {
        world
            .get::<GravityScale>(entity)
            .map(|g| g.0)
            .unwrap_or(1.0)
    }

    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32) {
        if let Some(mut gravity_scale) = world.get_mut::<GravityScale>(entity) {
            gravity_scale.0 = scale;
        } else if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(GravityScale(scale));
        }
    }

    fn get_gravity(world: &World, _entity: Entity) -> Vec2 {
        world
            .try_query::<&RapierConfiguration>()
            .and_then(|mut query| query.iter(world).next().map(|config| config.gravity))
            .unwrap_or(Vec2::new(0.0, -9.81))
    }

    fn get_mass(world: &World, entity: Entity) -> f32 {
        // Rapier fills ReadMassProperties after the first physics step.
        world
            .get::<ReadMassProperties>(entity)
            .map(|props| props.mass)
            .filter(|&mass| mass > 0.0 && mass.is_finite())
            .unwrap_or(1.0)
    }
}

/// Plugin that sets up Rapier2D-specific systems for the platformer controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_required_components::<PlatformerController, ControllerForces>();

        app.add_systems(
            Update,
            (rapier_contact_sensor, forward_collision_events).in_set(PlatformerSet::Sensors),
        );

        // Clear forces from the previous step, then hand this step's forces
        // to Rapier once locomotion has run.
        app.add_systems(
            FixedUpdate,
            clear_controller_forces.in_set(PlatformerSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            apply_controller_forces.in_set(PlatformerSet::FinalApplication),
        );
    }
}

/// Axis-aligned bounds of a collider centred at `center`.
///
/// Supports cuboids, capsules and balls. Returns `None` for other shapes.
pub fn collider_bounds(collider: &Collider, center: Vec2) -> Option<Rect> {
    let half_size = if let Some(cuboid) = collider.as_cuboid() {
        cuboid.half_extents()
    } else if let Some(capsule) = collider.as_capsule() {
        let segment = capsule.segment();
        let radius = capsule.radius();
        Vec2::new(
            (segment.a().x - segment.b().x).abs() / 2.0 + radius,
            (segment.a().y - segment.b().y).abs() / 2.0 + radius,
        )
    } else if let Some(ball) = collider.as_ball() {
        Vec2::splat(ball.radius())
    } else {
        return None;
    };

    (half_size.x > 0.0 && half_size.y > 0.0)
        .then(|| Rect::from_center_half_size(center, half_size))
}

/// Rapier-specific ground and wall sensing using shape intersection queries.
///
/// The probes are thin boxes along the bottom edge and the leading edge of
/// the collider bounds. Anything solid (not a sensor, not the character
/// itself) in the configured ground groups counts.
fn rapier_contact_sensor(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<
        (
            Entity,
            &GlobalTransform,
            &Collider,
            &SensorConfig,
            &MoveIntent,
            &mut ContactFacts,
        ),
        With<ControllerActive>,
    >,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, collider, config, intent, mut facts) in &mut q_controllers {
        let Some(bounds) = collider_bounds(collider, transform.translation().xy()) else {
            continue;
        };

        let filter = QueryFilter::default()
            .exclude_rigid_body(entity)
            .exclude_sensors()
            .groups(CollisionGroups::new(
                Group::ALL,
                Group::from_bits_truncate(config.ground_filter),
            ));

        let sensed = sense_contacts(bounds, intent.axis(), config, |min, max| {
            let half = (max - min) / 2.0;
            if half.x <= 0.0 || half.y <= 0.0 {
                return false;
            }
            let probe = Collider::cuboid(half.x, half.y);
            context
                .query_pipeline
                .intersection_with_shape(
                    context.colliders,
                    context.rigidbody_set,
                    (min + max) / 2.0,
                    0.0,
                    &probe,
                    filter,
                )
                .is_some()
        });

        if *facts != sensed {
            *facts = sensed;
        }
    }
}

/// Translate Rapier collision starts into [`BodyContactStarted`] for
/// controller entities.
fn forward_collision_events(
    mut collision_events: EventReader<CollisionEvent>,
    q_active: Query<(), With<ControllerActive>>,
    mut contacts: EventWriter<BodyContactStarted>,
) {
    for event in collision_events.read() {
        let &CollisionEvent::Started(a, b, _) = event else {
            continue;
        };
        for (entity, other) in [(a, b), (b, a)] {
            if q_active.contains(entity) {
                contacts.write(BodyContactStarted { entity, other });
            }
        }
    }
}

/// Controller-owned share of a body's [`ExternalForce`].
///
/// Keeps user-applied external forces intact: each step subtracts what the
/// controller applied last step before adding the new total.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ControllerForces {
    accumulated: Vec2,
    applied: Vec2,
}

impl ControllerForces {
    pub fn add(&mut self, force: Vec2) {
        self.accumulated += force;
    }

    /// Returns the force applied last step and clears the accumulator.
    fn prepare_new_frame(&mut self) -> Vec2 {
        self.accumulated = Vec2::ZERO;
        std::mem::take(&mut self.applied)
    }

    /// Returns the force to apply this step and remembers it.
    fn finalize_frame(&mut self) -> Vec2 {
        self.applied = self.accumulated;
        self.accumulated
    }
}

/// Remove last step's controller forces from `ExternalForce`.
///
/// Runs before locomotion, so external user forces are preserved while the
/// controller's forces are isolated between steps.
pub fn clear_controller_forces(mut q: Query<(&mut ExternalForce, &mut ControllerForces)>) {
    for (mut ext_force, mut forces) in &mut q {
        ext_force.force -= forces.prepare_new_frame();
    }
}

/// Add this step's accumulated controller forces to `ExternalForce`.
pub fn apply_controller_forces(mut q: Query<(&mut ExternalForce, &mut ControllerForces)>) {
    for (mut ext_force, mut forces) in &mut q {
        ext_force.force += forces.finalize_frame();
    }
}

/// Bundle for creating a platformer character with Rapier2D physics.
///
/// Provides the rigid body, velocity tracking, external forces and impulses,
/// gravity scale (used to suppress gravity during the jump extension),
/// frictionless contact so walls don't hold the character, collision events
/// for head-bump detection, and mass properties.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         PlatformerController::new(),
///         MovementParameters::default(),
///         PlayerControlled,
///         Rapier2dCharacterBundle::new(),
///         Collider::cuboid(0.4, 0.9),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`]
/// - `damping`: none (the controller brakes on its own)
/// - `friction`: zero, combined with `Min`
/// - `gravity_scale`: 1.0
#[derive(Bundle)]
pub struct Rapier2dCharacterBundle {
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity. Updated by Rapier each physics step.
    pub velocity: Velocity,
    /// Controller forces are merged into this by [`apply_controller_forces`].
    pub external_force: ExternalForce,
    /// Jump impulses.
    pub external_impulse: ExternalImpulse,
    pub gravity_scale: GravityScale,
    pub locked_axes: LockedAxes,
    pub damping: Damping,
    pub friction: Friction,
    pub active_events: ActiveEvents,
    /// Computed mass properties. Rapier updates this based on the entity's collider.
    pub mass_properties: ReadMassProperties,
}

impl Default for Rapier2dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier2dCharacterBundle {
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            external_impulse: ExternalImpulse::default(),
            gravity_scale: GravityScale(1.0),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 0.0,
            },
            friction: Friction {
                coefficient: 0.0,
                combine_rule: CoefficientCombineRule::Min,
            },
            active_events: ActiveEvents::COLLISION_EVENTS,
            // Rapier will update this based on collider after first physics step
            mass_properties: ReadMassProperties::default(),
        }
    }

    /// Set the rigid body type for the character.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set the damping coefficients for velocity reduction.
    ///
    /// Linear damping also slows the character below `move_speed` at full
    /// input, so keep it small.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }

    pub fn with_friction(mut self, coefficient: f32) -> Self {
        self.friction.coefficient = coefficient;
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
