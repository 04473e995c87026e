//! Horizontal camera follow.

use bevy::math::StableInterpolate;
use bevy::prelude::*;

/// Makes a camera track another entity's x position.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct CameraFollow {
    pub target: Entity,
    /// Time constant of the exponential smoothing. Non-positive snaps.
    pub smooth_time: f32,
}

impl CameraFollow {
    pub fn new(target: Entity, smooth_time: f32) -> Self {
        Self {
            target,
            smooth_time,
        }
    }

    /// Camera x after following `target_x` for `dt` seconds.
    pub fn step(&self, current_x: f32, target_x: f32, dt: f32) -> f32 {
        if self.smooth_time <= 0.0 {
            return target_x;
        }
        let mut x = current_x;
        x.smooth_nudge(&target_x, 1.0 / self.smooth_time, dt);
        x
    }
}

/// Move following cameras toward their targets. Only x changes.
pub fn follow_target(
    time: Res<Time>,
    q_targets: Query<&Transform, Without<CameraFollow>>,
    mut q_cameras: Query<(Entity, &CameraFollow, &mut Transform)>,
) {
    let dt = time.delta_secs();
    for (camera, follow, mut transform) in &mut q_cameras {
        let Ok(target) = q_targets.get(follow.target) else {
            debug!("Camera {camera} follow target {} not found", follow.target);
            continue;
        };
        let x = follow.step(transform.translation.x, target.translation.x, dt);
        if x != transform.translation.x {
            transform.translation.x = x;
        }
    }
}
