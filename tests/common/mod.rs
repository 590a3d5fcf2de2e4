//! Synthetic scans shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};
use nidprint::IdentificationService;

pub const SIDE: u32 = 64;

/// Concentric ridges around the centre, `period` pixels per ridge pair.
pub fn whorl(period: f64) -> GrayImage {
    let c = SIDE as f64 / 2.0;
    GrayImage::from_fn(SIDE, SIDE, |x, y| {
        let r = ((x as f64 - c).powi(2) + (y as f64 - c).powi(2)).sqrt();
        let v = 128.0 + 100.0 * (std::f64::consts::TAU * r / period).sin();
        Luma([v as u8])
    })
}

/// Straight ridges at `angle` radians.
pub fn arch(angle: f64, period: f64) -> GrayImage {
    let (s, c) = angle.sin_cos();
    GrayImage::from_fn(SIDE, SIDE, |x, y| {
        let t = x as f64 * c + y as f64 * s;
        let v = 128.0 + 100.0 * (std::f64::consts::TAU * t / period).sin();
        Luma([v as u8])
    })
}

// Ridge fixtures for galleries that must stay clear of noise. After
// binarization a black pixel always codes as "all neighbours set", so noise
// and fine ridges (period up to about twice the radius) both land mostly in
// the all-set and non-uniform bins and sit close together. Bands several
// radii wide keep their edges uniform and leave the non-uniform bin nearly
// empty.

pub fn wide_whorl() -> GrayImage {
    whorl(28.0)
}

pub fn wide_arch() -> GrayImage {
    arch(0.6, 24.0)
}

pub fn steep_arch() -> GrayImage {
    arch(1.4, 30.0)
}

pub fn broad_whorl() -> GrayImage {
    whorl(36.0)
}

/// Uniform noise from a fixed seed.
pub fn noise(seed: u64) -> GrayImage {
    let mut rng = fastrand::Rng::with_seed(seed);
    GrayImage::from_fn(SIDE, SIDE, |_, _| Luma([rng.u8(..)]))
}

pub fn encode(img: &GrayImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("encode synthetic scan");
    out.into_inner()
}

pub fn bmp(img: &GrayImage) -> Vec<u8> {
    encode(img, ImageFormat::Bmp)
}

/// Writes `<key>.bmp` into `dir`.
pub fn write_scan(dir: &Path, key: u64, img: &GrayImage) {
    fs::write(dir.join(format!("{key}.bmp")), bmp(img)).expect("write synthetic scan");
}

/// Asserts `scan` is identified as nobody, with its nearest template at or
/// beyond the acceptance threshold.
pub fn assert_not_identified(service: &IdentificationService, scan: &[u8]) {
    let threshold = service.match_config().threshold;
    let nearest = service.candidates(scan, 1).expect("rank candidates");
    assert!(
        nearest.first().is_none_or(|c| c.distance >= threshold),
        "nearest template {nearest:?} is inside threshold {threshold}"
    );
    assert_eq!(service.identify(scan).expect("identify"), nidprint::MatchResult::NotIdentified);
}
