//! Arena geometry
//!
//! An axis-aligned rectangle centred on the origin of its own local frame.
//! Bubble positions live in this frame; `frame` maps it into world space.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::transform::Transform2;
use crate::error::SimError;

/// The bounding rectangle bubbles are confined to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    /// Half width / half height (local units)
    pub half_extents: Vec2,
    /// Local -> world frame shared by every bubble in the arena
    pub frame: Transform2,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Result<Self, SimError> {
        Self::with_frame(width, height, Transform2::IDENTITY)
    }

    pub fn with_frame(width: f32, height: f32, frame: Transform2) -> Result<Self, SimError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(SimError::InvalidArena { width, height });
        }
        Ok(Self {
            half_extents: Vec2::new(width, height) * 0.5,
            frame,
        })
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.half_extents.x * 2.0
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.half_extents.y * 2.0
    }

    /// Whether a disk at `point` with `radius` lies fully inside the arena
    pub fn contains(&self, point: Vec2, radius: f32) -> bool {
        point.x.abs() + radius <= self.half_extents.x && point.y.abs() + radius <= self.half_extents.y
    }

    /// Largest radius that still fits inside the arena at all
    pub fn max_radius(&self) -> f32 {
        self.half_extents.x.min(self.half_extents.y)
    }

    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.frame.transform_point(local)
    }

    pub fn to_local(&self, world: Vec2) -> Vec2 {
        self.frame.inverse_transform_point(world)
    }
}
