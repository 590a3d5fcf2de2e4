//! Fingerprint scan acquisition.
//!
//! This is where a scan enters the identification pipeline. We take an
//! encoded byte stream (BMP from the scanner station, PNG/JPEG/TIFF from
//! uploads), check it against the configured limits, decode it, and hand a
//! [`RawImage`] to the normalizer.
//!
//! ## What we do here
//!
//! - **Bound the input** - empty payloads, oversize payloads and oversize
//!   dimensions are rejected before any pixel work happens downstream.
//! - **Decode** - the container format is sniffed from the bytes, never from
//!   a file extension.
//! - **Pick a layout** - colour scans become [`PixelLayout::Rgb`] (alpha is
//!   dropped), grayscale scans stay [`PixelLayout::Gray`]. Channel reduction
//!   itself belongs to the normalizer.
//! - **Log** - structured `decode_success` / `decode_failure` events via
//!   tracing.
//!
//! ## Example
//!
//! ```no_run
//! use ingest::{load_image, IngestConfig};
//!
//! let scan = load_image("fingerprints_raw/5000000001.bmp", &IngestConfig::default())?;
//! println!("{}x{} {:?}", scan.width(), scan.height(), scan.layout());
//! # Ok::<(), ingest::DecodeError>(())
//! ```
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use image::{ImageReader, Limits};
use tracing::{debug, warn};

mod config;
mod error;
mod types;

pub use crate::config::IngestConfig;
pub use crate::error::DecodeError;
pub use crate::types::{PixelLayout, RawImage};

/// Decode an encoded scan into a [`RawImage`].
pub fn decode_image(bytes: &[u8], cfg: &IngestConfig) -> Result<RawImage, DecodeError> {
    let start = Instant::now();
    match decode_inner(bytes, cfg) {
        Ok(image) => {
            debug!(
                width = image.width(),
                height = image.height(),
                layout = ?image.layout(),
                payload_bytes = bytes.len(),
                elapsed_micros = start.elapsed().as_micros(),
                "decode_success"
            );
            Ok(image)
        }
        Err(err) => {
            warn!(
                error = %err,
                payload_bytes = bytes.len(),
                elapsed_micros = start.elapsed().as_micros(),
                "decode_failure"
            );
            Err(err)
        }
    }
}

/// Read a scan from disk and decode it.
///
/// A missing or unreadable file surfaces as [`DecodeError::Io`].
pub fn load_image(path: impl AsRef<Path>, cfg: &IngestConfig) -> Result<RawImage, DecodeError> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_image(&bytes, cfg)
}

fn decode_inner(bytes: &[u8], cfg: &IngestConfig) -> Result<RawImage, DecodeError> {
    cfg.validate()?;
    if bytes.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }
    if bytes.len() > cfg.max_payload_bytes {
        return Err(DecodeError::PayloadTooLarge {
            size: bytes.len(),
            limit: cfg.max_payload_bytes,
        });
    }

    // Header only; pixel data is not touched until the geometry passes.
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    check_dimensions(width, height, cfg)?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(cfg.max_dimension);
    limits.max_image_height = Some(cfg.max_dimension);
    let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    reader.limits(limits);
    let decoded = reader.decode()?;

    if decoded.color().has_color() {
        let rgb = decoded.to_rgb8();
        RawImage::from_rgb(rgb.width(), rgb.height(), rgb.into_raw())
    } else {
        let gray = decoded.to_luma8();
        RawImage::from_gray(gray.width(), gray.height(), gray.into_raw())
    }
}

fn check_dimensions(width: u32, height: u32, cfg: &IngestConfig) -> Result<(), DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroDimensions { width, height });
    }
    if width > cfg.max_dimension || height > cfg.max_dimension {
        return Err(DecodeError::DimensionTooLarge {
            width,
            height,
            limit: cfg.max_dimension,
        });
    }
    Ok(())
}
