//! Non-local-means denoising.
//!
//! Every output sample is a weighted mean of the samples in its search
//! window, weighted by how similar their surrounding patches are. Patch
//! distances for one search offset are read off an integral image of squared
//! differences, so the cost per offset is linear in the image size regardless
//! of the patch size.

use rayon::prelude::*;

use crate::config::NormalizeConfig;

/// Weights below `exp(-WEIGHT_CUTOFF)` are treated as zero.
const WEIGHT_CUTOFF: f64 = 40.0;

pub(crate) fn denoise(src: &[u8], width: usize, height: usize, cfg: &NormalizeConfig) -> Vec<u8> {
    let t = (cfg.template_window / 2) as usize;
    let s = (cfg.search_window / 2) as usize;
    let border = s + t;
    let padded = Padded::new(src, width, height, border);

    let h = cfg.denoise_strength as f64;
    let inv_h2 = 1.0 / (h * h);
    let inv_area = 1.0 / ((2 * t + 1) * (2 * t + 1)) as f64;

    let region_w = width + 2 * t;
    let region_h = height + 2 * t;
    let mut integral = vec![0u64; (region_w + 1) * (region_h + 1)];

    let mut acc = vec![0f64; width * height];
    let mut weights = vec![0f64; width * height];

    let span = s as isize;
    for dy in -span..=span {
        for dx in -span..=span {
            padded.squared_diff_integral(s, dy, dx, region_w, region_h, &mut integral);
            let offset = OffsetPass {
                padded: &padded,
                integral: &integral,
                stride: region_w + 1,
                patch: 2 * t + 1,
                border,
                dy,
                dx,
                inv_area,
                inv_h2,
            };
            if cfg.use_parallel {
                acc.par_chunks_mut(width)
                    .zip(weights.par_chunks_mut(width))
                    .enumerate()
                    .for_each(|(row, (acc_row, w_row))| offset.accumulate_row(row, acc_row, w_row));
            } else {
                acc.chunks_mut(width)
                    .zip(weights.chunks_mut(width))
                    .enumerate()
                    .for_each(|(row, (acc_row, w_row))| offset.accumulate_row(row, acc_row, w_row));
            }
        }
    }

    acc.iter()
        .zip(weights.iter())
        .map(|(&a, &w)| (a / w).round().clamp(0.0, 255.0) as u8)
        .collect()
}

/// Source plane surrounded by a mirrored border (reflect-101, edge sample
/// not repeated).
struct Padded {
    data: Vec<u8>,
    width: usize,
}

impl Padded {
    fn new(src: &[u8], width: usize, height: usize, border: usize) -> Self {
        let pw = width + 2 * border;
        let ph = height + 2 * border;
        let mut data = Vec::with_capacity(pw * ph);
        for py in 0..ph {
            let y = reflect101(py as isize - border as isize, height);
            let row = &src[y * width..(y + 1) * width];
            data.extend((0..pw).map(|px| row[reflect101(px as isize - border as isize, width)]));
        }
        Self { data, width: pw }
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.width + col]
    }

    /// Integral image of `(P(r, c) - P(r + dy, c + dx))²` over the region
    /// that the patches of all original pixels cover.
    fn squared_diff_integral(
        &self,
        s: usize,
        dy: isize,
        dx: isize,
        region_w: usize,
        region_h: usize,
        integral: &mut [u64],
    ) {
        let stride = region_w + 1;
        for r in 0..region_h {
            let py = r + s;
            let qy = (py as isize + dy) as usize;
            let mut row_sum = 0u64;
            for c in 0..region_w {
                let px = c + s;
                let qx = (px as isize + dx) as usize;
                let d = self.at(py, px) as i32 - self.at(qy, qx) as i32;
                row_sum += (d * d) as u64;
                integral[(r + 1) * stride + c + 1] = integral[r * stride + c + 1] + row_sum;
            }
        }
    }
}

struct OffsetPass<'a> {
    padded: &'a Padded,
    integral: &'a [u64],
    stride: usize,
    patch: usize,
    border: usize,
    dy: isize,
    dx: isize,
    inv_area: f64,
    inv_h2: f64,
}

impl OffsetPass<'_> {
    fn accumulate_row(&self, row: usize, acc_row: &mut [f64], w_row: &mut [f64]) {
        let top = row * self.stride;
        let bottom = (row + self.patch) * self.stride;
        let src_row = (row as isize + self.border as isize + self.dy) as usize;
        for (col, (acc, weight)) in acc_row.iter_mut().zip(w_row.iter_mut()).enumerate() {
            let right = col + self.patch;
            let dist = self.integral[bottom + right] + self.integral[top + col]
                - self.integral[top + right]
                - self.integral[bottom + col];
            let scaled = dist as f64 * self.inv_area * self.inv_h2;
            if scaled > WEIGHT_CUTOFF {
                continue;
            }
            let w = (-scaled).exp();
            let src_col = (col as isize + self.border as isize + self.dx) as usize;
            *acc += w * self.padded.at(src_row, src_col) as f64;
            *weight += w;
        }
    }
}

fn reflect101(mut p: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    while p < 0 || p >= n {
        if p < 0 {
            p = -p;
        }
        if p >= n {
            p = 2 * n - 2 - p;
        }
    }
    p as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cfg() -> NormalizeConfig {
        NormalizeConfig::new().with_template_window(3).with_search_window(7)
    }

    #[test]
    fn reflect101_mirrors_without_repeating_edge() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(2, 5), 2);
        assert_eq!(reflect101(-7, 2), 1);
        assert_eq!(reflect101(9, 1), 0);
    }

    #[test]
    fn flat_plane_is_unchanged() {
        let src = vec![77u8; 20 * 12];
        assert_eq!(denoise(&src, 20, 12, &small_cfg()), src);
    }

    #[test]
    fn isolated_spike_is_attenuated() {
        let (w, h) = (24usize, 24usize);
        let mut src = vec![0u8; w * h];
        src[12 * w + 12] = 255;
        let cfg = NormalizeConfig::new().with_denoise_strength(30.0);
        let out = denoise(&src, w, h, &cfg);
        assert!(out[12 * w + 12] < 64, "spike survived: {}", out[12 * w + 12]);
    }

    #[test]
    fn parallel_matches_sequential_bit_for_bit() {
        let (w, h) = (31usize, 17usize);
        let src: Vec<u8> = (0..w * h)
            .map(|i| ((i * 37 + (i / w) * 11) % 251) as u8)
            .collect();
        let seq = denoise(&src, w, h, &small_cfg());
        let par = denoise(&src, w, h, &small_cfg().with_parallel(true));
        assert_eq!(seq, par);
    }

    #[test]
    fn single_pixel_image() {
        assert_eq!(denoise(&[42], 1, 1, &small_cfg()), vec![42]);
    }
}
