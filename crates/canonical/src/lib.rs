//! Fingerprint scan normalization.
//!
//! Turns a decoded [`ingest::RawImage`] into a [`NormalizedImage`]: a single
//! channel, binary ridge map with the same dimensions as the scan. The texture
//! extractor downstream relies on this being deterministic, so the same
//! scan and config always produce the same bytes.
//!
//! ## Stages
//!
//! 1. **Luminance** - colour scans are reduced with fixed-point BT.601
//!    weights; gray scans pass through.
//! 2. **CLAHE** - tile-wise histogram equalization with a clip limit
//!    (default 8x8 tiles, clip 2.0), bilinearly blended between tiles.
//! 3. **Non-local means** - patch-similarity denoising (default strength 3,
//!    7x7 patches, 21x21 search window).
//! 4. **Otsu** - one global threshold; samples above it become
//!    [`BINARY_HIGH`], the rest [`BINARY_LOW`].
//!
//! ## Parallelism
//!
//! `use_parallel` spreads the denoiser's row work over rayon. Each output
//! sample is accumulated in the same order either way, so the result is
//! bit-identical to the sequential path.

mod clahe;
mod config;
mod denoise;
mod error;
mod luma;
mod normalized;
mod pipeline;
mod threshold;

pub use crate::config::NormalizeConfig;
pub use crate::error::NormalizeError;
pub use crate::normalized::{NormalizedImage, BINARY_HIGH, BINARY_LOW};
pub use crate::pipeline::normalize;

#[cfg(test)]
mod tests {
    use super::*;
    use ingest::RawImage;

    fn fast_cfg() -> NormalizeConfig {
        NormalizeConfig::default()
            .with_template_window(3)
            .with_search_window(7)
    }

    fn ridges(size: u32) -> Vec<u8> {
        let c = size as f64 / 2.0;
        (0..size * size)
            .map(|i| {
                let (x, y) = ((i % size) as f64, (i / size) as f64);
                let r = ((x - c).powi(2) + (y - c).powi(2)).sqrt();
                (128.0 + 90.0 * (r * std::f64::consts::TAU / 8.0).sin()) as u8
            })
            .collect()
    }

    #[test]
    fn ridge_scan_becomes_two_level_image() {
        let raw = RawImage::from_gray(48, 40, ridges(48)[..48 * 40].to_vec()).unwrap();
        let out = normalize(&raw, &fast_cfg()).expect("normalize succeeds");

        assert_eq!(out.width(), 48);
        assert_eq!(out.height(), 40);
        assert_eq!(out.pixels().len(), 48 * 40);
        assert_eq!(
            out.levels().into_iter().collect::<Vec<_>>(),
            vec![BINARY_LOW, BINARY_HIGH]
        );
        assert_eq!(out.canonical_version(), 1);
    }

    #[test]
    fn normalization_is_deterministic() {
        let raw = RawImage::from_gray(40, 40, ridges(40)).unwrap();
        let a = normalize(&raw, &fast_cfg()).unwrap();
        let b = normalize(&raw, &fast_cfg()).unwrap();
        let c = normalize(&raw, &fast_cfg().with_parallel(true)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn tile_grid_reaches_equalization() {
        let raw = RawImage::from_gray(40, 40, ridges(40)).unwrap();
        for tiles in [1, 3, 8, 64] {
            let out = normalize(&raw, &fast_cfg().with_tile_grid(tiles)).unwrap();
            assert_eq!(out.pixels().len(), 40 * 40, "tile_grid {tiles}");
            assert!(out.levels().iter().all(|&v| v == BINARY_LOW || v == BINARY_HIGH));
        }
        let coarse = normalize(&raw, &fast_cfg().with_tile_grid(1)).unwrap();
        let fine = normalize(&raw, &fast_cfg().with_tile_grid(8)).unwrap();
        assert_ne!(coarse, fine);
    }

    #[test]
    fn neutral_rgb_scan_matches_gray_scan() {
        let gray = ridges(32);
        let rgb: Vec<u8> = gray.iter().flat_map(|&v| [v, v, v]).collect();
        let from_gray = normalize(&RawImage::from_gray(32, 32, gray).unwrap(), &fast_cfg()).unwrap();
        let from_rgb = normalize(&RawImage::from_rgb(32, 32, rgb).unwrap(), &fast_cfg()).unwrap();
        assert_eq!(from_gray, from_rgb);
    }

    #[test]
    fn invalid_config_is_rejected_before_any_work() {
        let raw = RawImage::from_gray(8, 8, vec![0; 64]).unwrap();
        let err = normalize(&raw, &NormalizeConfig::default().with_search_window(4)).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidConfig(_)));
    }

    #[test]
    fn single_pixel_scan_keeps_its_geometry() {
        let raw = RawImage::from_gray(1, 1, vec![200]).unwrap();
        let out = normalize(&raw, &fast_cfg()).unwrap();
        assert_eq!((out.width(), out.height()), (1, 1));
        assert_eq!(out.pixels().len(), 1);
    }
}
