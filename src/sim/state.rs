//! Bubble records and simulation state types
//!
//! All state that must survive between ticks lives here.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::motion::{Bounce, MotionState, Surroundings};
use crate::error::SimError;

/// Stable bubble handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BubbleId(pub u32);

/// What the bubble currently shows (arena-local space)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    /// Radians, normalized to [-π, π)
    pub rotation: f32,
    pub color: Color,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            color: Color::WHITE,
        }
    }
}

/// The parts of a bubble collision tests need
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub id: BubbleId,
    /// Local units
    pub radius: f32,
    pub layer: u32,
}

/// A bubble entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub id: BubbleId,
    pub radius: f32,
    /// Layer bit(s) this bubble lives on
    pub layer: u32,
    pub pose: Pose,
    pub motion: MotionState,
}

impl Bubble {
    pub fn new(
        id: BubbleId,
        position: Vec2,
        radius: f32,
        distance_to_move: f32,
        layer: u32,
    ) -> Result<Self, SimError> {
        let radius = SimError::check_radius(radius)?;
        if !position.is_finite() {
            return Err(SimError::NotFinite {
                field: "position",
                value: if position.x.is_finite() { position.y } else { position.x },
            });
        }
        Ok(Self {
            id,
            radius,
            layer,
            pose: Pose {
                position,
                ..Pose::default()
            },
            motion: MotionState::new(distance_to_move)?,
        })
    }

    pub fn collider(&self) -> Collider {
        Collider {
            id: self.id,
            radius: self.radius,
            layer: self.layer,
        }
    }

    /// Advance this bubble to `progress` within the current iteration
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        progress: f32,
        env: &Surroundings<'_>,
        rng: &mut R,
    ) -> Option<Bounce> {
        let collider = self.collider();
        self.motion
            .update(progress, &collider, &mut self.pose, env, rng)
    }

    /// Whether a local-space point lies on this bubble
    pub fn contains(&self, local: Vec2) -> bool {
        self.pose.position.distance(local) <= self.radius
    }

    pub fn snapshot(&self) -> BubbleSnapshot {
        BubbleSnapshot {
            id: self.id,
            position: self.pose.position,
            radius: self.radius,
            rotation: self.pose.rotation,
            color: self.pose.color,
            bounce_progress: self.motion.bounce_progress,
        }
    }
}

/// Read-only view of a bubble for output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubbleSnapshot {
    pub id: BubbleId,
    pub position: Vec2,
    pub radius: f32,
    pub rotation: f32,
    pub color: Color,
    pub bounce_progress: f32,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bubble_rejects_bad_input() {
        assert!(matches!(
            Bubble::new(BubbleId(1), Vec2::ZERO, 0.0, 50.0, 1),
            Err(SimError::InvalidRadius(_))
        ));
        assert!(matches!(
            Bubble::new(BubbleId(1), Vec2::ZERO, 5.0, 0.0, 1),
            Err(SimError::InvalidDistance(_))
        ));
        assert!(Bubble::new(BubbleId(1), Vec2::new(f32::NAN, 0.0), 5.0, 10.0, 1).is_err());
    }

    #[test]
    fn test_bubble_contains() {
        let bubble = Bubble::new(BubbleId(1), Vec2::new(10.0, 10.0), 5.0, 50.0, 1).unwrap();
        assert!(bubble.contains(Vec2::new(13.0, 14.0)));
        assert!(!bubble.contains(Vec2::new(16.0, 10.0)));
    }

    #[test]
    fn test_rng_state_is_deterministic() {
        let state = RngState::new(42);
        let a: u32 = state.to_rng().random();
        let b: u32 = state.to_rng().random();
        assert_eq!(a, b);
    }
}
