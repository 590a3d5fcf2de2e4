//! Configuration types for the normalization pipeline.
//!
//! [`NormalizeConfig`] carries every tunable of the four fixed steps
//! (luminance, local contrast equalization, denoising, binarization).
//!
//! # Versioning
//!
//! Any change to normalization behavior, bug fixes included, must bump
//! `version`: enrolled templates are only comparable with queries produced
//! by the same normalization.
//!
//! # Examples
//!
//! ```rust
//! use canonical::NormalizeConfig;
//!
//! let config = NormalizeConfig::default();
//! assert_eq!(config.tile_grid, 8);
//! assert_eq!(config.clip_limit, 2.0);
//! assert_eq!(config.search_window, 21);
//!
//! let strong = NormalizeConfig::new().with_denoise_strength(10.0);
//! strong.validate().unwrap();
//! ```

use serde::{Deserialize, Serialize};

use crate::error::NormalizeError;

/// Configuration for the normalization pipeline.
///
/// Serialized form (the `canonical` section of the service YAML):
///
/// ```json
/// {
///   "version": 1,
///   "tile_grid": 8,
///   "clip_limit": 2.0,
///   "denoise_strength": 3.0,
///   "template_window": 7,
///   "search_window": 21,
///   "use_parallel": false
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Semantic version of the normalization behavior. Must be >= 1.
    pub version: u32,

    /// Number of equalization tiles along each axis.
    ///
    /// The image is split into `tile_grid x tile_grid` tiles, each with its
    /// own clipped histogram. Images narrower than the grid use one tile per
    /// pixel column/row instead.
    pub tile_grid: u32,

    /// Contrast limit for adaptive equalization.
    ///
    /// Expressed relative to a flat histogram: a bin may hold at most
    /// `clip_limit * tile_area / 256` samples (never less than one). The
    /// excess is spread over all bins. `0.0` disables clipping.
    pub clip_limit: f32,

    /// Filter strength `h` of the non-local-means pass.
    ///
    /// Patch weights are `exp(-d / h²)` where `d` is the mean squared
    /// difference between patches. Larger values smooth more aggressively
    /// and eventually erase ridge detail.
    pub denoise_strength: f32,

    /// Side of the square patch compared by the denoiser. Must be odd.
    pub template_window: u32,

    /// Side of the square neighbourhood searched for similar patches. Must be odd.
    pub search_window: u32,

    /// Spread the denoising pass over the rayon thread pool.
    ///
    /// Output is bit-identical to the sequential path.
    pub use_parallel: bool,
}

impl NormalizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tile_grid(mut self, tiles: u32) -> Self {
        self.tile_grid = tiles;
        self
    }

    pub fn with_clip_limit(mut self, clip_limit: f32) -> Self {
        self.clip_limit = clip_limit;
        self
    }

    pub fn with_denoise_strength(mut self, h: f32) -> Self {
        self.denoise_strength = h;
        self
    }

    pub fn with_template_window(mut self, side: u32) -> Self {
        self.template_window = side;
        self
    }

    pub fn with_search_window(mut self, side: u32) -> Self {
        self.search_window = side;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), NormalizeError> {
        if self.version == 0 {
            return Err(NormalizeError::InvalidConfig(
                "config version must be >= 1".into(),
            ));
        }
        if self.tile_grid == 0 {
            return Err(NormalizeError::InvalidConfig(
                "tile_grid must be >= 1".into(),
            ));
        }
        if !self.clip_limit.is_finite() || self.clip_limit < 0.0 {
            return Err(NormalizeError::InvalidConfig(format!(
                "clip_limit must be a finite value >= 0 (got {})",
                self.clip_limit
            )));
        }
        if !self.denoise_strength.is_finite() || self.denoise_strength <= 0.0 {
            return Err(NormalizeError::InvalidConfig(format!(
                "denoise_strength must be a finite value > 0 (got {})",
                self.denoise_strength
            )));
        }
        if self.template_window == 0 || self.template_window % 2 == 0 {
            return Err(NormalizeError::InvalidConfig(format!(
                "template_window must be odd (got {})",
                self.template_window
            )));
        }
        if self.search_window == 0 || self.search_window % 2 == 0 {
            return Err(NormalizeError::InvalidConfig(format!(
                "search_window must be odd (got {})",
                self.search_window
            )));
        }
        Ok(())
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            tile_grid: 8,
            clip_limit: 2.0,
            denoise_strength: 3.0,
            template_window: 7,
            search_window: 21,
            use_parallel: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(NormalizeConfig::default().validate().is_ok());
    }

    #[test]
    fn builder_chain() {
        let cfg = NormalizeConfig::new()
            .with_tile_grid(4)
            .with_clip_limit(3.5)
            .with_denoise_strength(7.0)
            .with_template_window(5)
            .with_search_window(11)
            .with_parallel(true);
        assert_eq!(cfg.tile_grid, 4);
        assert_eq!(cfg.clip_limit, 3.5);
        assert_eq!(cfg.denoise_strength, 7.0);
        assert_eq!(cfg.template_window, 5);
        assert_eq!(cfg.search_window, 11);
        assert!(cfg.use_parallel);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn even_windows_rejected() {
        let cfg = NormalizeConfig::new().with_template_window(6);
        assert!(matches!(
            cfg.validate(),
            Err(NormalizeError::InvalidConfig(msg)) if msg.contains("template_window")
        ));
        let cfg = NormalizeConfig::new().with_search_window(20);
        assert!(matches!(
            cfg.validate(),
            Err(NormalizeError::InvalidConfig(msg)) if msg.contains("search_window")
        ));
    }

    #[test]
    fn non_positive_strength_rejected() {
        for h in [0.0, -1.0, f32::NAN] {
            let cfg = NormalizeConfig::new().with_denoise_strength(h);
            assert!(cfg.validate().is_err(), "h={h} should be rejected");
        }
    }

    #[test]
    fn negative_clip_limit_rejected() {
        let cfg = NormalizeConfig::new().with_clip_limit(-0.5);
        assert!(cfg.validate().is_err());
        assert!(NormalizeConfig::new().with_clip_limit(0.0).validate().is_ok());
    }

    #[test]
    fn zero_version_rejected() {
        let cfg = NormalizeConfig {
            version: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(NormalizeError::InvalidConfig(_))));
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = NormalizeConfig::new().with_tile_grid(6).with_parallel(true);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: NormalizeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
