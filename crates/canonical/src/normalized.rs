use std::collections::BTreeSet;

use image::GrayImage;
use ingest::DecodeError;
use serde::{Deserialize, Serialize};

use crate::error::NormalizeError;

/// Foreground level of a binarized scan.
pub const BINARY_HIGH: u8 = 255;
/// Background level of a binarized scan.
pub const BINARY_LOW: u8 = 0;

/// Single-channel, binarized scan ready for texture analysis.
///
/// Only [`crate::normalize`] and [`NormalizedImage::from_binary`] construct
/// this type, so every instance holds exactly `width * height` samples, each
/// either [`BINARY_LOW`] or [`BINARY_HIGH`]. Deserialization goes through
/// `from_binary` as well.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "NormalizedRepr")]
pub struct NormalizedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    /// Normalization config version that produced this image.
    canonical_version: u32,
}

#[derive(Deserialize)]
struct NormalizedRepr {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    canonical_version: u32,
}

impl TryFrom<NormalizedRepr> for NormalizedImage {
    type Error = NormalizeError;

    fn try_from(repr: NormalizedRepr) -> Result<Self, Self::Error> {
        NormalizedImage::from_binary(repr.width, repr.height, repr.pixels, repr.canonical_version)
    }
}

impl NormalizedImage {
    pub(crate) fn from_parts(width: u32, height: u32, pixels: Vec<u8>, canonical_version: u32) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
            canonical_version,
        }
    }

    /// Rebuild a normalized image from an already binarized buffer, such as a
    /// stored intermediate.
    pub fn from_binary(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        canonical_version: u32,
    ) -> Result<Self, NormalizeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroDimensions { width, height }.into());
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(DecodeError::LayoutMismatch {
                expected,
                actual: pixels.len(),
            }
            .into());
        }
        if let Some((index, &value)) = pixels
            .iter()
            .enumerate()
            .find(|&(_, &v)| v != BINARY_LOW && v != BINARY_HIGH)
        {
            return Err(NormalizeError::NonBinaryPixel { index, value });
        }
        Ok(Self::from_parts(width, height, pixels, canonical_version))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn canonical_version(&self) -> u32 {
        self.canonical_version
    }

    /// Row-major samples.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Distinct sample values present in the image, ascending.
    pub fn levels(&self) -> BTreeSet<u8> {
        let mut seen = [false; 256];
        for &v in &self.pixels {
            seen[v as usize] = true;
        }
        (0..=255u8).filter(|&v| seen[v as usize]).collect()
    }

    /// Copy into an `image` buffer, e.g. for debugging dumps.
    pub fn to_gray_image(&self) -> GrayImage {
        // Geometry is validated at construction.
        GrayImage::from_raw(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }
}
