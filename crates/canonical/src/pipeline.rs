use std::time::Instant;

use image::GrayImage;
use ingest::{DecodeError, RawImage};
use tracing::{debug, warn};

use crate::clahe::equalize;
use crate::config::NormalizeConfig;
use crate::denoise::denoise;
use crate::error::NormalizeError;
use crate::luma::to_luma;
use crate::normalized::NormalizedImage;
use crate::threshold::binarize;

/// Normalize a decoded scan into a binary ridge image.
///
/// Stages run in a fixed order: luminance, CLAHE, non-local means, Otsu.
/// Output dimensions always equal the input's.
pub fn normalize(raw: &RawImage, cfg: &NormalizeConfig) -> Result<NormalizedImage, NormalizeError> {
    let start = Instant::now();
    match normalize_inner(raw, cfg) {
        Ok(image) => {
            debug!(
                width = image.width(),
                height = image.height(),
                canonical_version = image.canonical_version(),
                parallel = cfg.use_parallel,
                elapsed_micros = start.elapsed().as_micros(),
                "normalize_success"
            );
            Ok(image)
        }
        Err(err) => {
            warn!(
                error = %err,
                elapsed_micros = start.elapsed().as_micros(),
                "normalize_failure"
            );
            Err(err)
        }
    }
}

fn normalize_inner(raw: &RawImage, cfg: &NormalizeConfig) -> Result<NormalizedImage, NormalizeError> {
    cfg.validate()?;

    let (width, height) = (raw.width(), raw.height());
    let (w, h) = (width as usize, height as usize);

    let luma = to_luma(raw);
    let equalized = equalize(&luma, w, h, cfg.tile_grid, cfg.clip_limit);
    let smoothed = denoise(&equalized, w, h, cfg);

    let actual = smoothed.len();
    let gray = GrayImage::from_raw(width, height, smoothed).ok_or(DecodeError::LayoutMismatch {
        expected: w * h,
        actual,
    })?;
    let pixels = binarize(gray);

    Ok(NormalizedImage::from_parts(width, height, pixels, cfg.version))
}
