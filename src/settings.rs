//! Simulation settings
//!
//! Loaded from a JSON file (every field optional, missing ones take their
//! defaults) and validated once before a simulator is built.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;
use crate::sim::motion::MotionTuning;
use crate::sim::spatial::ALL_LAYERS;

/// Peer lookup strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpatialBackend {
    /// Check every bubble against every other bubble
    #[default]
    BruteForce,
    /// Hashed uniform grid with square cells of `cell_size` world units
    Grid { cell_size: f32 },
}

impl SpatialBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpatialBackend::BruteForce => "brute_force",
            SpatialBackend::Grid { .. } => "grid",
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed (same seed + same calls = same run)
    pub seed: u64,

    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,

    // === Motion ===
    /// Local units per second
    pub velocity: f32,
    /// Travel per iteration (local units)
    pub distance_to_move: f32,
    /// Spin per iteration is drawn from ±this many degrees
    pub rotation_range_degrees: f32,
    /// Extra push past the radius after a bounce
    pub bounce_epsilon: f32,
    /// Layers bubbles collide with
    pub layer_mask: u32,

    // === Bubbles ===
    /// Bubbles placed by `spawn_random` at startup
    pub bubble_count: usize,
    pub default_radius: f32,
    /// Range used for random spawns and resize-on-pick
    pub min_radius: f32,
    pub max_radius: f32,
    /// Alpha of random target colours
    pub color_alpha: f32,

    pub spatial: SpatialBackend,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,

            arena_width: DEFAULT_ARENA_WIDTH,
            arena_height: DEFAULT_ARENA_HEIGHT,

            velocity: DEFAULT_VELOCITY,
            distance_to_move: DEFAULT_DISTANCE_TO_MOVE,
            rotation_range_degrees: ROTATION_RANGE_DEGREES,
            bounce_epsilon: BOUNCE_EPSILON,
            layer_mask: ALL_LAYERS,

            bubble_count: 12,
            default_radius: DEFAULT_BUBBLE_RADIUS,
            min_radius: DEFAULT_MIN_RADIUS,
            max_radius: DEFAULT_MAX_RADIUS,
            color_alpha: 1.0,

            spatial: SpatialBackend::BruteForce,
        }
    }
}

impl SimConfig {
    /// Seconds per iteration
    pub fn iteration_duration(&self) -> f32 {
        self.distance_to_move / self.velocity
    }

    /// Motion knobs shared by every bubble
    pub fn tuning(&self) -> MotionTuning {
        MotionTuning {
            color_alpha: self.color_alpha,
            rotation_range_degrees: self.rotation_range_degrees,
            bounce_epsilon: self.bounce_epsilon,
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SimError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;

        if !positive(self.arena_width) || !positive(self.arena_height) {
            return Err(SimError::InvalidArena {
                width: self.arena_width,
                height: self.arena_height,
            });
        }
        if !positive(self.velocity) {
            return Err(SimError::InvalidVelocity(self.velocity));
        }
        if !positive(self.distance_to_move) {
            return Err(SimError::InvalidDistance(self.distance_to_move));
        }
        SimError::check_radius(self.default_radius)?;
        SimError::check_radius(self.min_radius)?;
        SimError::check_radius(self.max_radius)?;
        if self.min_radius > self.max_radius {
            return Err(SimError::InvalidRadiusRange {
                min: self.min_radius,
                max: self.max_radius,
            });
        }
        for (field, value) in [
            ("rotation_range_degrees", self.rotation_range_degrees),
            ("bounce_epsilon", self.bounce_epsilon),
            ("color_alpha", self.color_alpha),
        ] {
            if !value.is_finite() {
                return Err(SimError::NotFinite { field, value });
            }
        }
        if self.rotation_range_degrees.abs() > ROTATION_RANGE_DEGREES {
            return Err(SimError::InvalidRotationRange(self.rotation_range_degrees));
        }
        if let SpatialBackend::Grid { cell_size } = self.spatial {
            if !positive(cell_size) {
                return Err(SimError::InvalidCellSize(cell_size));
            }
        }
        Ok(())
    }

    /// Suspicious but runnable values, meant to be logged with `warn!`
    pub fn warnings(&self) -> Vec<String> {
        let mut w = Vec::new();
        let half_min = self.arena_width.min(self.arena_height) * 0.5;
        if self.max_radius >= half_min {
            w.push(format!(
                "max_radius {} does not fit in a {}x{} arena",
                self.max_radius, self.arena_width, self.arena_height
            ));
        }
        if self.bounce_epsilon < 0.0 {
            w.push(format!(
                "bounce_epsilon {} negative; bubbles may re-collide every tick",
                self.bounce_epsilon
            ));
        }
        if !(0.0..=1.0).contains(&self.color_alpha) {
            w.push(format!("color_alpha {} outside 0..1", self.color_alpha));
        }
        if let SpatialBackend::Grid { cell_size } = self.spatial {
            if cell_size * 4.0 < self.min_radius {
                w.push(format!(
                    "grid cell_size {cell_size} much smaller than min_radius {}; large bubbles fall back to a scan",
                    self.min_radius
                ));
            }
        }
        if self.layer_mask == 0 {
            w.push("layer_mask is 0; bubbles will never collide with each other".into());
        }
        if self.bubble_count > 10_000 {
            w.push(format!(
                "bubble_count {} very high; consider the grid backend",
                self.bubble_count
            ));
        }
        w
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SimConfig = serde_json::from_str(&data)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when it is missing or malformed
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e}; using default config");
                Self::default()
            }
        }
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }
}
