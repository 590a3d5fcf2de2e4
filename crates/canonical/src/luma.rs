//! Channel reduction.

use ingest::{PixelLayout, RawImage};

// BT.601 weights in Q14 fixed point; they sum to 1 << 14.
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;
const ROUND: u32 = 1 << (SHIFT - 1);

/// Collapse a raw scan into one luminance sample per pixel.
///
/// Gray input is copied as-is.
pub(crate) fn to_luma(raw: &RawImage) -> Vec<u8> {
    match raw.layout() {
        PixelLayout::Gray => raw.data().to_vec(),
        PixelLayout::Rgb => raw
            .data()
            .chunks_exact(3)
            .map(|px| luminance(px[0], px[1], px[2]))
            .collect(),
    }
}

#[inline]
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let y = (r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT + ROUND) >> SHIFT;
    y.min(255) as u8
}
