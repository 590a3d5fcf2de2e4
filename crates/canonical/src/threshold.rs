use image::GrayImage;
use imageproc::contrast::otsu_level;

use crate::normalized::{BINARY_HIGH, BINARY_LOW};

/// Global Otsu binarization. Samples strictly above the level become
/// [`BINARY_HIGH`], everything else [`BINARY_LOW`].
pub(crate) fn binarize(gray: GrayImage) -> Vec<u8> {
    let level = otsu_level(&gray);
    gray.into_raw()
        .into_iter()
        .map(|v| if v > level { BINARY_HIGH } else { BINARY_LOW })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(width: u32, height: u32, data: Vec<u8>) -> GrayImage {
        GrayImage::from_raw(width, height, data).expect("geometry matches")
    }

    #[test]
    fn bimodal_plane_splits_between_modes() {
        let data: Vec<u8> = (0..64).map(|i| if i % 2 == 0 { 40 } else { 200 }).collect();
        let out = binarize(plane(8, 8, data.clone()));
        for (src, dst) in data.iter().zip(out.iter()) {
            let expected = if *src == 200 { BINARY_HIGH } else { BINARY_LOW };
            assert_eq!(*dst, expected);
        }
    }

    #[test]
    fn ramp_yields_both_levels_only() {
        let out = binarize(plane(16, 16, (0..=255u8).collect()));
        assert!(out.iter().all(|&v| v == BINARY_HIGH || v == BINARY_LOW));
        assert!(out.contains(&BINARY_HIGH));
        assert!(out.contains(&BINARY_LOW));
    }
}
