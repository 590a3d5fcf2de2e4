//! # NIDPrint texture descriptors
//!
//! Turns a binarized scan ([`canonical::NormalizedImage`]) into a
//! [`Descriptor`]: the normalized histogram of rotation-invariant uniform
//! local binary pattern codes. This histogram is what gets enrolled and what
//! the matcher compares.
//!
//! ## Operator
//!
//! For every pixel whose radius-`R` circle lies fully inside the image, `P`
//! points are sampled on that circle with bilinear interpolation and
//! compared against the centre (`sample >= centre` sets the bit). Patterns
//! with at most two 0/1 transitions around the circle are coded by their
//! number of set bits (`0..=P`); all other patterns share code `P + 1`.
//!
//! The `P + 2` counts are divided by `count + epsilon`, so bins sum to 1
//! within floating-point tolerance and a degenerate histogram stays finite.
//!
//! Extraction is a pure function of `(image, config)`. With `use_parallel`
//! the row counts are merged as integers, so the result does not change.
//!
//! ```
//! use canonical::NormalizedImage;
//! use perceptual::{extract, TextureConfig};
//!
//! let pixels = (0..32 * 32).map(|i| if (i % 32) % 6 < 3 { 255 } else { 0 }).collect();
//! let image = NormalizedImage::from_binary(32, 32, pixels, 1).unwrap();
//! let cfg = TextureConfig::default();
//!
//! let descriptor = extract(&image, &cfg).unwrap();
//! assert_eq!(descriptor.len(), cfg.descriptor_len());
//! assert!((descriptor.sum() - 1.0).abs() < 1e-6);
//! ```
pub mod config;
pub mod descriptor;
mod lbp;

use std::time::Instant;

use canonical::NormalizedImage;
use tracing::debug;

pub use crate::config::{ExtractionError, TextureConfig};
pub use crate::descriptor::{Descriptor, DescriptorMeta};
use crate::lbp::code_histogram;

/// Current texture algorithm version for this crate.
pub const TEXTURE_VERSION: u16 = 1;

/// Human-readable algorithm identifier.
pub const TEXTURE_ALGORITHM: &str = "lbp_uniform_v1";

/// Compute the texture descriptor of a normalized scan.
pub fn extract(image: &NormalizedImage, cfg: &TextureConfig) -> Result<Descriptor, ExtractionError> {
    cfg.validate()?;

    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(ExtractionError::EmptyImage);
    }
    if width <= 2 * cfg.radius || height <= 2 * cfg.radius {
        return Err(ExtractionError::ImageTooSmall {
            width,
            height,
            radius: cfg.radius,
        });
    }

    let start = Instant::now();
    let counts = code_histogram(image, cfg);
    let total: u64 = counts.iter().sum();
    let denom = total as f64 + cfg.epsilon;
    let bins: Vec<f64> = counts.iter().map(|&c| c as f64 / denom).collect();

    debug!(
        width,
        height,
        radius = cfg.radius,
        points = cfg.points,
        sampled_pixels = total,
        parallel = cfg.use_parallel,
        elapsed_micros = start.elapsed().as_micros(),
        "extract_success"
    );

    Ok(Descriptor::from_parts(bins, DescriptorMeta::for_config(cfg)))
}
