//! # `platformer_controller`
//!
//! An arcade-style 2D platformer locomotion and jump controller with physics
//! backend abstraction.
//!
//! This crate provides a responsive character controller that:
//! - Accelerates, brakes and reverses with rate-limited horizontal forces
//! - Buffers jumps pressed in mid-air and fires them on landing
//! - Gives variable jump height by suppressing gravity while jump is held
//! - Slides down and kicks off walls
//! - Abstracts the physics backend for easy swapping (Rapier2D included)
//!
//! ## Architecture
//!
//! Two cadences cooperate:
//! 1. The logic tick (`Update`) senses ground and walls, detects the landing
//!    edge, fires buffered jumps and processes button events.
//! 2. The physics tick (`FixedUpdate`) applies horizontal forces, caps
//!    wall-slide speed and advances the jump extension timer.
//!
//! The controller reads the rigid body into a [`body::BodyState`], changes
//! it, and writes it back through the backend. Integration is left to the
//! physics engine.
//!
//! ## Usage
//!
//! ```rust
//! use platformer_controller::prelude::*;
//!
//! // Components for a player character. `PlatformerController` pulls in
//! // default `MovementParameters`, `SensorConfig` and `MoveIntent`.
//! let _controller = PlatformerController::new();
//! let params = MovementParameters::default().with_movement(10.0, 30.0);
//! assert!(params.validate().is_ok());
//! ```

use bevy::prelude::*;
use bevy::transform::TransformSystem;

pub mod animation;
pub mod backend;
pub mod body;
pub mod camera;
pub mod config;
pub mod controller;
pub mod events;
pub mod input;
pub mod intent;
pub mod jump;
pub mod locomotion;
pub mod sensor;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::animation::AnimatorParameters;
    pub use crate::backend::{ForceMode, PlatformerPhysicsBackend};
    pub use crate::body::BodyState;
    pub use crate::camera::CameraFollow;
    pub use crate::config::{ConfigError, MovementParameters, SensorConfig};
    pub use crate::controller::{JumpKind, JumpOutcome, PlatformerController};
    pub use crate::events::{GameEventRaised, GameEvents};
    pub use crate::input::{KeyboardControlsPlugin, PlayerControlled};
    pub use crate::intent::{
        BodyContactStarted, ControlAction, ControlEvent, ControlPhase, MoveIntent,
        ReloadSceneRequested,
    };
    pub use crate::sensor::ContactFacts;
    pub use crate::state::{Airborne, Grounded, JumpPhase, TouchingWall, WallContact};
    pub use crate::systems::{AttachError, AttachFault, ControllerActive};
    pub use crate::{PlatformerControllerPlugin, PlatformerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dCharacterBundle};
}

/// System sets for ordering controller work.
///
/// `Update`: `Attach` → `Sensors` → `Landing` → `Input`.
/// `FixedUpdate`: `Preparation` → `Locomotion` → `FinalApplication`.
/// `PostUpdate`: `Presentation`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformerSet {
    /// Validate newly added controllers against the backend.
    Attach,
    /// Backend sensor systems write [`sensor::ContactFacts`].
    Sensors,
    /// Landing-edge detection and buffered jumps.
    Landing,
    /// Button events and contact reports.
    Input,
    /// Backend bookkeeping before forces are computed.
    Preparation,
    /// Horizontal forces, wall-slide cap and jump extension timer.
    Locomotion,
    /// Backend hands accumulated forces to the physics engine.
    FinalApplication,
    /// Animation parameters, facing and camera.
    Presentation,
}

/// Main plugin for the platformer controller.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (overlap queries, force application, etc.).
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
///     .add_plugins(PlatformerControllerPlugin::<Rapier2dBackend>::default())
///     .add_plugins(KeyboardControlsPlugin)
///     .run();
/// ```
pub struct PlatformerControllerPlugin<B: backend::PlatformerPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::PlatformerPhysicsBackend> Default for PlatformerControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::PlatformerPhysicsBackend> Plugin for PlatformerControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<controller::PlatformerController>();
        app.register_type::<config::MovementParameters>();
        app.register_type::<config::SensorConfig>();
        app.register_type::<intent::MoveIntent>();
        app.register_type::<sensor::ContactFacts>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::TouchingWall>();
        app.register_type::<camera::CameraFollow>();

        app.add_event::<intent::ControlEvent>();
        app.add_event::<intent::BodyContactStarted>();
        app.add_event::<intent::ReloadSceneRequested>();
        app.add_event::<events::GameEventRaised>();
        app.init_resource::<events::GameEvents>();

        app.configure_sets(
            Update,
            (
                PlatformerSet::Attach,
                PlatformerSet::Sensors,
                PlatformerSet::Landing,
                PlatformerSet::Input,
            )
                .chain(),
        );
        app.configure_sets(
            FixedUpdate,
            (
                PlatformerSet::Preparation,
                PlatformerSet::Locomotion,
                PlatformerSet::FinalApplication,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            Update,
            (
                systems::attach_controllers::<B>,
                systems::detach_controllers,
            )
                .chain()
                .in_set(PlatformerSet::Attach),
        );
        app.add_systems(
            Update,
            systems::update_landing::<B>.in_set(PlatformerSet::Landing),
        );
        app.add_systems(
            Update,
            (
                systems::handle_control_events::<B>,
                systems::handle_body_contacts::<B>,
                systems::sync_state_markers,
            )
                .chain()
                .in_set(PlatformerSet::Input),
        );
        app.add_systems(
            Update,
            events::dispatch_game_events.after(PlatformerSet::Input),
        );

        app.add_systems(
            FixedUpdate,
            systems::apply_locomotion::<B>.in_set(PlatformerSet::Locomotion),
        );

        app.add_systems(
            PostUpdate,
            (animation::project_animation::<B>, camera::follow_target)
                .in_set(PlatformerSet::Presentation)
                .before(TransformSystem::TransformPropagate),
        );
    }
}
