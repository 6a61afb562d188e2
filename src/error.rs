//! Error type for configuration and construction
//!
//! The simulation itself never fails: numeric degeneracies are resolved by
//! policy inside `sim`. Errors only surface when a caller hands over a
//! configuration or bubble that cannot be simulated.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("bubble radius must be finite and > 0 (got {0})")]
    InvalidRadius(f32),

    #[error("velocity must be finite and > 0 (got {0})")]
    InvalidVelocity(f32),

    #[error("distance to move must be finite and > 0 (got {0})")]
    InvalidDistance(f32),

    #[error("arena dimensions must be finite and > 0 (got {width}x{height})")]
    InvalidArena { width: f32, height: f32 },

    #[error("transform scale must be finite and > 0 (got {0})")]
    InvalidScale(f32),

    #[error("radius range min ({min}) greater than max ({max})")]
    InvalidRadiusRange { min: f32, max: f32 },

    #[error("rotation range must be within ±360 degrees (got {0})")]
    InvalidRotationRange(f32),

    #[error("grid cell size must be finite and > 0 (got {0})")]
    InvalidCellSize(f32),

    #[error("{field} must be finite (got {value})")]
    NotFinite { field: &'static str, value: f32 },

    #[error("read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// Reject anything that is not a finite, strictly positive radius
    pub fn check_radius(radius: f32) -> Result<f32, SimError> {
        if radius.is_finite() && radius > 0.0 {
            Ok(radius)
        } else {
            Err(SimError::InvalidRadius(radius))
        }
    }
}
