//! Collision detection for bubbles
//!
//! Two narrow-phase tests: a disk against the inside of the arena rectangle
//! (local space) and a disk against a peer disk (world space). Both report a
//! contact point and a normal pointing away from the obstacle, into the bubble.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use crate::sign;

/// Below this length a vector is treated as having no direction
pub const DEGENERATE_LENGTH: f32 = 1e-6;

/// A confirmed contact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Point on the obstacle surface
    pub point: Vec2,
    /// Unit normal pointing from the obstacle toward the bubble centre
    pub normal: Vec2,
}

/// Check a bubble against the arena walls
///
/// Per axis the distance from the centre to the nearer edge is
/// `extent - |pos|`; the bubble touches the wall once the smaller of the two
/// drops to its radius. The distance is signed so a centre that already
/// escaped still reports a hit and gets pushed back in.
pub fn bubble_arena_collision(pos: Vec2, radius: f32, arena: &Arena) -> Option<Contact> {
    let ext = arena.half_extents;
    let dist_x = ext.x - pos.x.abs();
    let dist_y = ext.y - pos.y.abs();

    if dist_x.min(dist_y) > radius {
        return None;
    }

    if dist_x <= dist_y {
        let sx = sign(pos.x);
        Some(Contact {
            point: Vec2::new(sx * ext.x, pos.y.clamp(-ext.y, ext.y)),
            normal: Vec2::new(-sx, 0.0),
        })
    } else {
        let sy = sign(pos.y);
        Some(Contact {
            point: Vec2::new(pos.x.clamp(-ext.x, ext.x), sy * ext.y),
            normal: Vec2::new(0.0, -sy),
        })
    }
}

/// Check two disks for overlap
///
/// Touching counts as a hit. The contact sits on the peer's surface along the
/// line joining the centres. Coincident centres have no defined normal, so +X
/// is used.
pub fn bubble_bubble_collision(
    center: Vec2,
    radius: f32,
    peer_center: Vec2,
    peer_radius: f32,
) -> Option<Contact> {
    let delta = center - peer_center;
    let dist = delta.length();
    if dist > radius + peer_radius {
        return None;
    }

    let normal = if dist < DEGENERATE_LENGTH {
        Vec2::X
    } else {
        delta / dist
    };

    Some(Contact {
        point: peer_center + normal * peer_radius,
        normal,
    })
}

/// Reflect a direction off a surface
///
/// Standard reflection: d' = d - 2(d·n)n
#[inline]
pub fn reflect(dir: Vec2, normal: Vec2) -> Vec2 {
    dir - 2.0 * dir.dot(normal) * normal
}
