//! Bubble Bounce - a deterministic bubble animation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion state, collisions, bounce simulator)
//! - `settings`: Data-driven simulation configuration
//! - `error`: Error type shared by configuration and construction

pub mod error;
pub mod settings;
pub mod sim;

pub use error::SimError;
pub use settings::{SimConfig, SpatialBackend};
pub use sim::{BounceSimulator, Bubble, BubbleId, MotionState, TickReport};

use std::f32::consts::{PI, TAU};

/// Simulation configuration constants
pub mod consts {
    /// Outward nudge (local units) applied past the bubble radius after a bounce,
    /// so the next tick does not re-detect the same obstacle
    pub const BOUNCE_EPSILON: f32 = 1.0;
    /// Random spin per iteration is drawn from ±this many degrees
    pub const ROTATION_RANGE_DEGREES: f32 = 360.0;

    /// Travel per iteration (local units)
    pub const DEFAULT_DISTANCE_TO_MOVE: f32 = 50.0;
    /// Local units per second; iteration duration = distance / velocity
    pub const DEFAULT_VELOCITY: f32 = 25.0;
    pub const DEFAULT_BUBBLE_RADIUS: f32 = 10.0;
    pub const DEFAULT_MIN_RADIUS: f32 = 6.0;
    pub const DEFAULT_MAX_RADIUS: f32 = 24.0;

    /// Arena dimensions
    pub const DEFAULT_ARENA_WIDTH: f32 = 400.0;
    pub const DEFAULT_ARENA_HEIGHT: f32 = 300.0;

    /// Largest frame delta accepted by `advance` (prevents huge jumps after a stall)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Iteration wraps processed per `advance` call
    pub const MAX_WRAPS_PER_FRAME: u32 = 4;

    /// Layer every bubble lives on unless told otherwise
    pub const DEFAULT_LAYER: u32 = 1;

    /// Placement attempts per bubble in `spawn_random`
    pub const SPAWN_ATTEMPTS: u32 = 64;
}

/// Normalized angle to [-π, π)
///
/// Constant time for any magnitude; non-finite input comes back as NaN.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU);
    // rem_euclid may round up to exactly TAU
    if wrapped >= TAU { -PI } else { wrapped - PI }
}

/// Shortest-arc interpolation between two angles (radians).
///
/// This is the single-axis equivalent of a quaternion slerp: a 300° delta is
/// travelled as -60°. `t` is clamped to [0, 1].
#[inline]
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let delta = normalize_angle(to - from);
    normalize_angle(from + delta * t.clamp(0.0, 1.0))
}

/// Sign with zero treated as positive
#[inline]
pub fn sign(v: f32) -> f32 {
    if v >= 0.0 { 1.0 } else { -1.0 }
}
