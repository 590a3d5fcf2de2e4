//! Core data model for acquired scans.
//!
//! A [`RawImage`] is the transient, undecorated pixel grid produced by
//! decoding a scan. It is owned by the enrollment or identification call that
//! decoded it and is dropped once the descriptor has been extracted.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Channel layout of a [`RawImage`] buffer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    /// One 8-bit luminance sample per pixel.
    Gray,
    /// Three interleaved 8-bit samples per pixel, in R, G, B order.
    Rgb,
}

impl PixelLayout {
    /// Number of interleaved samples per pixel.
    pub const fn channels(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Rgb => 3,
        }
    }
}

/// Row-major 8-bit pixel grid with either one or three channels.
///
/// Construction always validates geometry, so every `RawImage` in circulation
/// has non-zero dimensions and a buffer of exactly
/// `width * height * layout.channels()` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl RawImage {
    /// Build an image from an interleaved buffer.
    pub fn new(
        width: u32,
        height: u32,
        layout: PixelLayout,
        data: Vec<u8>,
    ) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroDimensions { width, height });
        }
        let expected = width as usize * height as usize * layout.channels();
        if data.len() != expected {
            return Err(DecodeError::LayoutMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// Convenience constructor for single-channel buffers.
    pub fn from_gray(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DecodeError> {
        Self::new(width, height, PixelLayout::Gray, data)
    }

    /// Convenience constructor for interleaved RGB buffers.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DecodeError> {
        Self::new(width, height, PixelLayout::Rgb, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of pixels (not samples) in the grid.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
