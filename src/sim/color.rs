//! Bubble tint
//!
//! Linear RGBA with channel-wise interpolation and HSV construction for the
//! per-iteration random target colour.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// RGBA colour, channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Channel-wise linear interpolation (t clamped to [0, 1])
    pub fn lerp(self, to: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (to.r - self.r) * t,
            g: self.g + (to.g - self.g) * t,
            b: self.b + (to.b - self.b) * t,
            a: self.a + (to.a - self.a) * t,
        }
    }

    /// Build from hue/saturation/value, hue in [0, 1)
    pub fn from_hsv(h: f32, s: f32, v: f32, a: f32) -> Color {
        let h = h.rem_euclid(1.0);
        let c = v * s;
        let h_prime = h * 6.0;
        let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());
        let m = v - c;

        let (r, g, b) = if h_prime < 1.0 {
            (c, x, 0.0)
        } else if h_prime < 2.0 {
            (x, c, 0.0)
        } else if h_prime < 3.0 {
            (0.0, c, x)
        } else if h_prime < 4.0 {
            (0.0, x, c)
        } else if h_prime < 5.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        Color::rgba(r + m, g + m, b + m, a)
    }

    /// Random hue at full saturation and full brightness
    pub fn random_vivid<R: Rng + ?Sized>(rng: &mut R, alpha: f32) -> Color {
        let hue: f32 = rng.random();
        Color::from_hsv(hue, 1.0, 1.0, alpha)
    }

    /// HSV value (max channel)
    pub fn value(&self) -> f32 {
        self.r.max(self.g).max(self.b)
    }

    /// HSV saturation
    pub fn saturation(&self) -> f32 {
        let max = self.value();
        if max <= 0.0 {
            return 0.0;
        }
        let min = self.r.min(self.g).min(self.b);
        (max - min) / max
    }
}
