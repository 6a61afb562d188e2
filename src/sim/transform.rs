//! Explicit local <-> world coordinate frames
//!
//! Bubbles move in the arena's local space. Peer queries run in world space,
//! so every conversion goes through a uniform-scale 2-D transform.

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Translation, rotation (radians) and uniform scale, applied scale -> rotate -> translate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2 {
    pub translation: Vec2,
    pub rotation: f32,
    pub scale: f32,
}

impl Default for Transform2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2 {
    pub const IDENTITY: Transform2 = Transform2 {
        translation: Vec2::ZERO,
        rotation: 0.0,
        scale: 1.0,
    };

    pub fn new(translation: Vec2, rotation: f32, scale: f32) -> Result<Self, SimError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(SimError::InvalidScale(scale));
        }
        if !rotation.is_finite() {
            return Err(SimError::NotFinite {
                field: "rotation",
                value: rotation,
            });
        }
        Ok(Self {
            translation,
            rotation,
            scale,
        })
    }

    fn affine(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(Vec2::splat(self.scale), self.rotation, self.translation)
    }

    /// Local point -> world point
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        self.affine().transform_point2(p)
    }

    /// World point -> local point
    pub fn inverse_transform_point(&self, p: Vec2) -> Vec2 {
        Vec2::from_angle(-self.rotation).rotate(p - self.translation) / self.scale
    }

    /// Local direction -> world direction (rotation only, length preserved)
    pub fn transform_direction(&self, d: Vec2) -> Vec2 {
        Vec2::from_angle(self.rotation).rotate(d)
    }

    /// World direction -> local direction (rotation only, length preserved)
    pub fn inverse_transform_direction(&self, d: Vec2) -> Vec2 {
        Vec2::from_angle(-self.rotation).rotate(d)
    }

    /// Local length -> world length
    #[inline]
    pub fn length_to_world(&self, len: f32) -> f32 {
        len * self.scale
    }

    /// World length -> local length
    #[inline]
    pub fn length_to_local(&self, len: f32) -> f32 {
        len / self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_rejects_bad_scale() {
        assert!(matches!(
            Transform2::new(Vec2::ZERO, 0.0, 0.0),
            Err(SimError::InvalidScale(_))
        ));
        assert!(Transform2::new(Vec2::ZERO, 0.0, -1.0).is_err());
        assert!(Transform2::new(Vec2::ZERO, f32::NAN, 1.0).is_err());
    }

    #[test]
    fn test_point_round_trip() {
        let t = Transform2::new(Vec2::new(10.0, -5.0), 0.7, 2.5).unwrap();
        let p = Vec2::new(3.0, 4.0);
        let back = t.inverse_transform_point(t.transform_point(p));
        assert!((back - p).length() < 0.001);
    }

    #[test]
    fn test_quarter_turn_with_scale() {
        let t = Transform2::new(Vec2::new(100.0, 0.0), FRAC_PI_2, 2.0).unwrap();
        let w = t.transform_point(Vec2::new(1.0, 0.0));
        assert!((w - Vec2::new(100.0, 2.0)).length() < 0.001);

        // Directions ignore scale and translation
        let d = t.transform_direction(Vec2::X);
        assert!((d - Vec2::Y).length() < 0.001);
        let back = t.inverse_transform_direction(Vec2::Y);
        assert!((back - Vec2::X).length() < 0.001);
    }

    #[test]
    fn test_lengths() {
        let t = Transform2::new(Vec2::ZERO, 0.0, 4.0).unwrap();
        assert_eq!(t.length_to_world(2.5), 10.0);
        assert_eq!(t.length_to_local(10.0), 2.5);
    }
}
