//! Per-bubble motion state
//!
//! A bubble does not integrate velocity. Each iteration it interpolates from a
//! start pose to a target pose as progress runs 0 -> 1. A bounce rewrites the
//! remaining path in place: the leg restarts at the contact, heads along the
//! reflected direction, and is re-parameterized over the progress still left
//! so the bubble keeps its apparent speed.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::collision::{
    Contact, DEGENERATE_LENGTH, bubble_arena_collision, bubble_bubble_collision, reflect,
};
use super::color::Color;
use super::spatial::{LayerMask, SpatialQuery};
use super::state::{BubbleId, Collider, Pose};
use crate::consts::*;
use crate::error::SimError;
use crate::lerp_angle;

/// Shared knobs for every bubble's motion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionTuning {
    /// Alpha of each new random target colour
    pub color_alpha: f32,
    /// Random spin per iteration is drawn from ±this many degrees
    pub rotation_range_degrees: f32,
    /// Extra push past the radius after a bounce (local units)
    pub bounce_epsilon: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            color_alpha: 1.0,
            rotation_range_degrees: ROTATION_RANGE_DEGREES,
            bounce_epsilon: BOUNCE_EPSILON,
        }
    }
}

/// What a bubble can collide with during one tick
pub struct Surroundings<'a> {
    pub arena: &'a Arena,
    /// Peers as committed at the end of the previous tick (world space)
    pub peers: &'a dyn SpatialQuery,
    pub layer_mask: LayerMask,
    pub tuning: MotionTuning,
}

/// Which obstacle caused a bounce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BounceKind {
    Arena,
    Peer(BubbleId),
}

/// A resolved bounce
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounce {
    pub kind: BounceKind,
    /// Progress at which the bounce was resolved
    pub progress: f32,
    /// Contact in arena-local space
    pub contact: Contact,
    /// Unit direction of the new leg
    pub direction: Vec2,
}

/// Interpolation state for one bubble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub start_position: Vec2,
    pub target_position: Vec2,
    pub start_rotation: f32,
    pub target_rotation: f32,
    pub start_color: Color,
    pub target_color: Color,
    /// Progress of the most recent bounce this iteration (0 = none yet)
    pub bounce_progress: f32,
    /// Last unit direction travelled; ZERO until the first leg exists.
    /// Carries momentum over a leg that collapsed to zero length.
    pub heading: Vec2,
    distance_to_move: f32,
}

impl MotionState {
    pub fn new(distance_to_move: f32) -> Result<Self, SimError> {
        if !distance_to_move.is_finite() || distance_to_move <= 0.0 {
            return Err(SimError::InvalidDistance(distance_to_move));
        }
        Ok(Self {
            start_position: Vec2::ZERO,
            target_position: Vec2::ZERO,
            start_rotation: 0.0,
            target_rotation: 0.0,
            start_color: Color::WHITE,
            target_color: Color::WHITE,
            bounce_progress: 0.0,
            heading: Vec2::ZERO,
            distance_to_move,
        })
    }

    /// Travel per iteration
    pub fn distance_to_move(&self) -> f32 {
        self.distance_to_move
    }

    /// Unit direction of the current leg, falling back to the last heading
    pub fn direction(&self) -> Option<Vec2> {
        let leg = self.target_position - self.start_position;
        if leg.length() > DEGENERATE_LENGTH {
            Some(leg.normalize())
        } else if self.heading.length() > DEGENERATE_LENGTH {
            Some(self.heading)
        } else {
            None
        }
    }

    /// Map iteration progress onto the current leg.
    ///
    /// After a bounce at `b` the leg covers `[b, 1]`; a bounce at the very end
    /// leaves nothing to cover and counts as arrived.
    pub fn leg_progress(&self, progress: f32) -> f32 {
        let remaining = 1.0 - self.bounce_progress;
        if remaining <= f32::EPSILON {
            return 1.0;
        }
        ((progress - self.bounce_progress) / remaining).clamp(0.0, 1.0)
    }

    /// Start a new iteration from the bubble's current pose
    pub fn initialize<R: Rng + ?Sized>(&mut self, pose: &Pose, tuning: &MotionTuning, rng: &mut R) {
        self.bounce_progress = 0.0;

        self.start_color = pose.color;
        self.target_color = Color::random_vivid(rng, tuning.color_alpha);

        let direction = self
            .direction()
            .unwrap_or_else(|| Vec2::from_angle(rng.random_range(0.0..TAU)));
        self.heading = direction;
        self.start_position = pose.position;
        self.target_position = pose.position + direction * self.distance_to_move;

        let range = tuning.rotation_range_degrees.abs().to_radians();
        self.start_rotation = pose.rotation;
        self.target_rotation = pose.rotation + rng.random_range(-range..=range);
    }

    /// Start mid-iteration: the leg is shortened to the travel left at
    /// `progress` so the newcomer moves at the same speed as everyone else.
    pub fn join_at<R: Rng + ?Sized>(
        &mut self,
        pose: &Pose,
        tuning: &MotionTuning,
        rng: &mut R,
        progress: f32,
    ) {
        self.initialize(pose, tuning, rng);
        let progress = progress.clamp(0.0, 1.0);
        let dir = self.heading;
        self.target_position = self.start_position + dir * self.distance_to_move * (1.0 - progress);
        self.bounce_progress = progress;
    }

    /// Test the bubble against the arena, then against its nearest peer.
    ///
    /// The arena wins when both would fire: at most one bounce is resolved per
    /// tick. The direction is reflected only while the bubble heads into the
    /// obstacle (`d·n < 0`); a bubble already moving away keeps its direction and
    /// only has its start point pushed clear. Returns the bounce when the path
    /// was rewritten.
    pub fn detect_collisions(
        &mut self,
        progress: f32,
        collider: &Collider,
        pose: &Pose,
        env: &Surroundings<'_>,
    ) -> Option<Bounce> {
        let eps = env.tuning.bounce_epsilon;
        // Where a bubble centre may restart without touching a wall
        let limit = (env.arena.half_extents - Vec2::splat(collider.radius)).max(Vec2::ZERO);

        if let Some(contact) = bubble_arena_collision(pose.position, collider.radius, env.arena) {
            return self.bounce(progress, collider.radius, contact, BounceKind::Arena, eps, limit);
        }

        let frame = &env.arena.frame;
        let center = frame.transform_point(pose.position);
        let radius = frame.length_to_world(collider.radius);
        let peer = env
            .peers
            .find_overlapping(center, radius, env.layer_mask, collider.id)?;
        let contact = bubble_bubble_collision(center, radius, peer.center, peer.radius)?;

        let local = Contact {
            point: frame.inverse_transform_point(contact.point),
            normal: frame.inverse_transform_direction(contact.normal).normalize_or_zero(),
        };
        self.bounce(progress, collider.radius, local, BounceKind::Peer(peer.id), eps, limit)
    }

    /// Rewrite the leg to leave `contact` along the reflected direction.
    ///
    /// The restart point is kept within `±limit` so a peer push never lands
    /// the bubble outside the arena.
    fn bounce(
        &mut self,
        progress: f32,
        radius: f32,
        contact: Contact,
        kind: BounceKind,
        eps: f32,
        limit: Vec2,
    ) -> Option<Bounce> {
        // No direction, nothing to reflect
        let dir = self.direction()?;
        let normal = contact.normal;

        // Only reflect while heading into the obstacle; a bubble already
        // separating keeps its course and is just pushed clear
        let new_dir = if dir.dot(normal) < 0.0 {
            reflect(dir, normal).normalize_or_zero()
        } else {
            dir
        };

        let leg = self.start_position.distance(self.target_position);
        let remaining = leg * (1.0 - self.leg_progress(progress));

        self.start_position = (contact.point + normal * (radius + eps)).clamp(-limit, limit);
        self.target_position = self.start_position + new_dir * remaining;
        self.bounce_progress = progress;
        self.heading = new_dir;

        log::debug!(
            "bounce {:?} at progress {:.3}: dir ({:.2}, {:.2}) -> ({:.2}, {:.2})",
            kind,
            progress,
            dir.x,
            dir.y,
            new_dir.x,
            new_dir.y
        );

        Some(Bounce {
            kind,
            progress,
            contact,
            direction: new_dir,
        })
    }

    /// Advance to `progress` and write the resulting pose.
    ///
    /// `progress == 0` starts a new iteration and leaves the pose untouched.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        progress: f32,
        collider: &Collider,
        pose: &mut Pose,
        env: &Surroundings<'_>,
        rng: &mut R,
    ) -> Option<Bounce> {
        if progress <= 0.0 {
            self.initialize(pose, &env.tuning, rng);
            return None;
        }
        let progress = progress.min(1.0);

        let bounce = self.detect_collisions(progress, collider, pose, env);

        pose.color = self.start_color.lerp(self.target_color, progress);
        pose.rotation = lerp_angle(self.start_rotation, self.target_rotation, progress);
        pose.position = self
            .start_position
            .lerp(self.target_position, self.leg_progress(progress));

        bounce
    }
}
