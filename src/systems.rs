//! Core controller systems.
//!
//! These systems connect the [`PlatformerController`] to the world. They are
//! generic over the physics backend to allow different physics engines to be
//! used. Each one snapshots the rigid body into a [`BodyState`], lets the
//! controller change it, and flushes the result back through the backend.

use bevy::ecs::event::EventCursor;
use bevy::prelude::*;
use thiserror::Error;

use crate::backend::PlatformerPhysicsBackend;
use crate::body::BodyState;
use crate::config::MovementParameters;
use crate::controller::PlatformerController;
use crate::intent::{
    BodyContactStarted, ControlAction, ControlEvent, ControlPhase, MoveIntent,
    ReloadSceneRequested,
};
use crate::sensor::ContactFacts;
use crate::state::{Airborne, Grounded, TouchingWall};

/// Marker added once a controller has passed attach validation.
///
/// Every controller system only touches entities carrying this marker.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ControllerActive;

/// Why a controller could not be attached to its entity.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AttachError {
    #[error("entity {0} has no rigid body")]
    MissingRigidBody(Entity),
    #[error("entity {0} has no collider with measurable bounds")]
    MissingBounds(Entity),
    #[error("entity {entity} has invalid movement parameters: {reason}")]
    InvalidParameters { entity: Entity, reason: String },
}

/// Attach failure recorded on the entity. The controller stays inert.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct AttachFault(pub AttachError);

fn validate_attach<B: PlatformerPhysicsBackend>(
    world: &World,
    entity: Entity,
) -> Result<(), AttachError> {
    if !B::has_rigid_body(world, entity) {
        return Err(AttachError::MissingRigidBody(entity));
    }
    if B::get_bounds(world, entity).is_none() {
        return Err(AttachError::MissingBounds(entity));
    }
    if let Some(params) = world.get::<MovementParameters>(entity) {
        params
            .validate()
            .map_err(|err| AttachError::InvalidParameters {
                entity,
                reason: err.to_string(),
            })?;
    }
    Ok(())
}

/// Validate newly added controllers.
///
/// A controller whose entity lacks a rigid body or a measurable collider
/// never activates: an error is logged and an [`AttachFault`] is recorded
/// instead of [`ControllerActive`]. Remove the fault to retry.
pub fn attach_controllers<B: PlatformerPhysicsBackend>(world: &mut World) {
    let pending: Vec<Entity> = world
        .query_filtered::<Entity, (
            With<PlatformerController>,
            Without<ControllerActive>,
            Without<AttachFault>,
        )>()
        .iter(world)
        .collect();

    for entity in pending {
        let result = validate_attach::<B>(world, entity);
        let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
            continue;
        };
        match result {
            Ok(()) => {
                entity_mut.insert(ControllerActive);
                info!("Platformer controller attached to {entity}");
            }
            Err(err) => {
                error!("Platformer controller not attached: {err}");
                entity_mut.insert(AttachFault(err));
            }
        }
    }
}

/// Deactivate entities whose controller was removed.
pub fn detach_controllers(
    mut commands: Commands,
    mut removed: RemovedComponents<PlatformerController>,
) {
    for entity in removed.read() {
        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.try_remove::<(ControllerActive, AttachFault)>();
        }
        debug!("Platformer controller detached from {entity}");
    }
}

fn active_controllers(world: &mut World) -> Vec<Entity> {
    world
        .query_filtered::<Entity, (With<PlatformerController>, With<ControllerActive>)>()
        .iter(world)
        .collect()
}

/// Run `f` against the entity's controller and a fresh body snapshot, then
/// flush the body. Returns `None` if the entity is not an active controller.
fn with_controller<B, R>(
    world: &mut World,
    entity: Entity,
    f: impl FnOnce(&mut PlatformerController, &mut BodyState, &MovementParameters) -> R,
) -> Option<R>
where
    B: PlatformerPhysicsBackend,
{
    if world.get::<ControllerActive>(entity).is_none() {
        return None;
    }
    let params = world.get::<MovementParameters>(entity).copied()?;
    let mut body = BodyState::read::<B>(world, entity);
    let result = {
        let mut controller = world.get_mut::<PlatformerController>(entity)?;
        f(&mut *controller, &mut body, &params)
    };
    body.flush::<B>(world, entity);
    Some(result)
}

/// Record this tick's contact facts and fire buffered jumps on landing.
///
/// Runs after the backend's sensor systems and before any input of the
/// same tick.
pub fn update_landing<B: PlatformerPhysicsBackend>(world: &mut World) {
    for entity in active_controllers(world) {
        let facts = world.get::<ContactFacts>(entity).copied().unwrap_or_default();
        with_controller::<B, _>(world, entity, |controller, body, params| {
            if controller.update_contacts(facts) {
                debug!("{entity} landed");
                controller.resolve_landing(body, params);
            }
        });
    }
}

/// Dispatch button events to their characters.
pub fn handle_control_events<B: PlatformerPhysicsBackend>(
    world: &mut World,
    mut cursor: Local<EventCursor<ControlEvent>>,
) {
    let events: Vec<ControlEvent> = match world.get_resource::<Events<ControlEvent>>() {
        Some(events) => cursor.read(events).copied().collect(),
        None => return,
    };

    for event in events {
        let ControlEvent {
            entity,
            action,
            phase,
        } = event;
        let handled = with_controller::<B, _>(world, entity, |controller, body, params| {
            match (action, phase) {
                (ControlAction::Jump, ControlPhase::Pressed) => {
                    let outcome = controller.press_jump(body, params);
                    trace!("{entity} jump pressed: {outcome:?}");
                }
                (ControlAction::Jump, ControlPhase::Released) => {
                    controller.release_jump(body);
                }
                (ControlAction::Crouch, ControlPhase::Pressed) => controller.press_crouch(),
                (ControlAction::Crouch, ControlPhase::Released) => controller.release_crouch(),
                (ControlAction::Special, ControlPhase::Pressed) => {
                    let special = controller.toggle_special();
                    debug!("{entity} special toggled: {special}");
                }
                (ControlAction::Restart, ControlPhase::Pressed) => {}
                (ControlAction::Special | ControlAction::Restart, ControlPhase::Released) => {}
            }
        });

        if handled.is_none() {
            trace!("Ignoring {action:?} for inactive entity {entity}");
            continue;
        }
        if action == ControlAction::Restart && phase == ControlPhase::Pressed {
            info!("{entity} requested a scene reload");
            world.send_event(ReloadSceneRequested {
                requested_by: entity,
            });
        }
    }
}

/// Forward new physics contacts to their controllers (head bump detection).
pub fn handle_body_contacts<B: PlatformerPhysicsBackend>(
    world: &mut World,
    mut cursor: Local<EventCursor<BodyContactStarted>>,
) {
    let events: Vec<BodyContactStarted> =
        match world.get_resource::<Events<BodyContactStarted>>() {
            Some(events) => cursor.read(events).copied().collect(),
            None => return,
        };

    for event in events {
        with_controller::<B, _>(world, event.entity, |controller, body, params| {
            controller.contact_began(body, params)
        });
    }
}

/// Fixed-step locomotion: horizontal force, wall-slide cap and jump
/// extension timer.
pub fn apply_locomotion<B: PlatformerPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);
    for entity in active_controllers(world) {
        let move_axis = world
            .get::<MoveIntent>(entity)
            .map(MoveIntent::axis)
            .unwrap_or(0.0);
        with_controller::<B, _>(world, entity, |controller, body, params| {
            controller.fixed_tick(body, params, move_axis, dt);
        });
    }
}

/// Sync state marker components based on controller state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<
        (
            Entity,
            &PlatformerController,
            Has<Grounded>,
            Has<Airborne>,
            Option<&TouchingWall>,
        ),
        With<ControllerActive>,
    >,
) {
    for (entity, controller, has_grounded, has_airborne, wall) in &q_controllers {
        let state = &controller.state;

        // Sync Grounded/Airborne
        if state.grounded_now && !has_grounded {
            commands.entity(entity).insert(Grounded);
            commands.entity(entity).remove::<Airborne>();
        } else if !state.grounded_now && !has_airborne {
            commands.entity(entity).remove::<Grounded>();
            commands.entity(entity).insert(Airborne);
        }

        // Sync TouchingWall
        match (state.wall_contact.is_touching(), wall) {
            (true, Some(marker)) if marker.side == state.wall_contact => {}
            (true, _) => {
                commands
                    .entity(entity)
                    .insert(TouchingWall::new(state.wall_contact));
            }
            (false, Some(_)) => {
                commands.entity(entity).remove::<TouchingWall>();
            }
            (false, None) => {}
        }
    }
}
