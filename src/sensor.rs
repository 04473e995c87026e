//! Ground and wall sensing.
//!
//! Contact facts are computed from thin probe regions laid along the
//! character's bounding box. The probes themselves are pure geometry; the
//! actual overlap test is supplied by the physics backend, so the same code
//! runs against Rapier or a fake world in tests.

use bevy::prelude::*;

use crate::config::SensorConfig;
use crate::state::WallContact;

/// Contact facts produced by one sensing pass.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[reflect(Component)]
pub struct ContactFacts {
    /// Bottom probe overlaps ground geometry.
    pub grounded: bool,
    /// Leading-edge probe overlaps ground geometry while airborne.
    pub wall: WallContact,
}

/// Probe region along the bottom edge of `bounds`.
///
/// Inset horizontally by `config.inset` of the box width on each side and
/// extending `config.probe_thickness` below the box.
pub fn ground_probe(bounds: Rect, config: &SensorConfig) -> Rect {
    let inset = bounds.width() * config.inset;
    Rect {
        min: Vec2::new(bounds.min.x + inset, bounds.min.y - config.probe_thickness),
        max: Vec2::new(bounds.max.x - inset, bounds.min.y),
    }
}

/// Probe region along the leading edge of `bounds` in `direction`.
///
/// Returns `None` for a zero direction. The region is inset vertically by
/// `config.inset` of the box height at top and bottom.
pub fn wall_probe(bounds: Rect, direction: f32, config: &SensorConfig) -> Option<Rect> {
    let inset = bounds.height() * config.inset;
    let (min_x, max_x) = if direction < 0.0 {
        (bounds.min.x - config.probe_thickness, bounds.min.x)
    } else if direction > 0.0 {
        (bounds.max.x, bounds.max.x + config.probe_thickness)
    } else {
        return None;
    };

    Some(Rect {
        min: Vec2::new(min_x, bounds.min.y + inset),
        max: Vec2::new(max_x, bounds.max.y - inset),
    })
}

/// Compute ground and wall contact for one tick.
///
/// `overlap` answers whether the region `[min, max]` overlaps ground
/// geometry. The wall probe is only cast when airborne with non-zero
/// horizontal input, and only in the direction of that input.
pub fn sense_contacts(
    bounds: Rect,
    move_axis: f32,
    config: &SensorConfig,
    mut overlap: impl FnMut(Vec2, Vec2) -> bool,
) -> ContactFacts {
    let ground = ground_probe(bounds, config);
    let grounded = overlap(ground.min, ground.max);

    if grounded {
        return ContactFacts {
            grounded,
            wall: WallContact::None,
        };
    }

    let wall = match wall_probe(bounds, move_axis, config) {
        Some(probe) if overlap(probe.min, probe.max) => WallContact::from_direction(move_axis),
        _ => WallContact::None,
    };

    ContactFacts { grounded, wall }
}
