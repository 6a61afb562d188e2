//! Deterministic simulation module
//!
//! All bubble logic lives here. This module must be pure and deterministic:
//! - Externally supplied progress/time only
//! - Seeded RNG only
//! - Stable iteration order (by bubble ID)
//! - No rendering or platform dependencies

pub mod arena;
pub mod collision;
pub mod color;
pub mod motion;
pub mod simulator;
pub mod spatial;
pub mod state;
pub mod transform;

pub use arena::Arena;
pub use collision::{Contact, bubble_arena_collision, bubble_bubble_collision, reflect};
pub use color::Color;
pub use motion::{Bounce, BounceKind, MotionState, MotionTuning, Surroundings};
pub use simulator::{BounceSimulator, TickReport};
pub use spatial::{
    ALL_LAYERS, BruteForceQuery, LayerMask, PeerCircle, PeerIndex, SpatialQuery, UniformGrid,
};
pub use state::{Bubble, BubbleId, BubbleSnapshot, Collider, Pose, RngState};
pub use transform::Transform2;
