//! Configuration and error types for texture descriptors.
//!
//! The descriptor length is derived from [`TextureConfig::points`], so the
//! same config has to reach both the extractor and whatever compares the
//! descriptors later.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest supported sample count. Sample bits are packed into a `u64`.
pub const MAX_POINTS: u32 = 64;

/// Parameters of the uniform local binary pattern operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextureConfig {
    /// Configuration schema version. Bump on any change that can alter a
    /// descriptor.
    pub version: u32,
    /// Radius of the sampling circle in pixels.
    pub radius: u32,
    /// Number of samples on the circle. Conventionally `8 * radius`.
    pub points: u32,
    /// Added to the histogram denominator so an empty histogram stays finite.
    pub epsilon: f64,
    /// Accumulate the histogram over rows in parallel.
    pub use_parallel: bool,
}

impl TextureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the radius. Leaves `points` alone; pair with [`Self::with_points`].
    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Number of histogram bins: `points` uniform codes, the all-ones code
    /// and one bucket for every non-uniform pattern.
    pub fn descriptor_len(&self) -> usize {
        self.points as usize + 2
    }

    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.version < 1 {
            return Err(ExtractionError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.radius < 1 {
            return Err(ExtractionError::InvalidConfigRadius {
                radius: self.radius,
            });
        }
        if self.points < 1 || self.points > MAX_POINTS {
            return Err(ExtractionError::InvalidConfigPoints {
                points: self.points,
            });
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ExtractionError::InvalidConfigEpsilon {
                epsilon: self.epsilon,
            });
        }
        Ok(())
    }
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            version: 1,
            radius: 3,
            points: 24,
            epsilon: 1e-7,
            use_parallel: false,
        }
    }
}

/// Errors returned by descriptor extraction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("invalid config version {version}; expected >= 1")]
    InvalidConfigVersion { version: u32 },

    #[error("invalid config: radius must be >= 1 (got {radius})")]
    InvalidConfigRadius { radius: u32 },

    #[error("invalid config: points must be in 1..=64 (got {points})")]
    InvalidConfigPoints { points: u32 },

    #[error("invalid config: epsilon must be finite and > 0 (got {epsilon})")]
    InvalidConfigEpsilon { epsilon: f64 },

    #[error("normalized image has no pixels")]
    EmptyImage,

    #[error("{width}x{height} image has no pixel with a full radius-{radius} neighbourhood")]
    ImageTooSmall { width: u32, height: u32, radius: u32 },

    #[error("invalid descriptor bins: {0}")]
    InvalidBins(String),
}
