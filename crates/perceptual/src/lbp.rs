//! Rotation-invariant uniform local binary patterns.

use canonical::NormalizedImage;
use rayon::prelude::*;

use crate::config::TextureConfig;

/// One sample on the circle, relative to the centre pixel, with the bilinear
/// corners and fractional offsets precomputed.
#[derive(Debug, Clone, Copy)]
struct Sample {
    r0: isize,
    r1: isize,
    c0: isize,
    c1: isize,
    dr: f64,
    dc: f64,
}

fn round5(v: f64) -> f64 {
    (v * 1e5).round() / 1e5
}

fn circle(radius: u32, points: u32) -> Vec<Sample> {
    let r = radius as f64;
    (0..points)
        .map(|p| {
            let theta = std::f64::consts::TAU * p as f64 / points as f64;
            let rp = round5(-r * theta.sin());
            let cp = round5(r * theta.cos());
            let (fr, fc) = (rp.floor(), cp.floor());
            Sample {
                r0: fr as isize,
                r1: rp.ceil() as isize,
                c0: fc as isize,
                c1: cp.ceil() as isize,
                dr: rp - fr,
                dc: cp - fc,
            }
        })
        .collect()
}

/// Histogram of uniform LBP codes over every pixel with a full
/// neighbourhood. `counts.len() == points + 2`.
pub(crate) fn code_histogram(image: &NormalizedImage, cfg: &TextureConfig) -> Vec<u64> {
    let samples = circle(cfg.radius, cfg.points);
    let bins = cfg.descriptor_len();
    let margin = cfg.radius as usize;
    let (w, h) = (image.width() as usize, image.height() as usize);
    if w <= 2 * margin || h <= 2 * margin {
        return vec![0; bins];
    }
    let rows = margin..h - margin;
    let op = Operator {
        pixels: image.pixels(),
        width: w,
        margin,
        samples: &samples,
        points: cfg.points,
    };

    if cfg.use_parallel {
        rows.into_par_iter()
            .fold(
                || vec![0u64; bins],
                |mut acc, row| {
                    op.accumulate_row(row, &mut acc);
                    acc
                },
            )
            .reduce(
                || vec![0u64; bins],
                |mut a, b| {
                    a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                    a
                },
            )
    } else {
        let mut acc = vec![0u64; bins];
        for row in rows {
            op.accumulate_row(row, &mut acc);
        }
        acc
    }
}

struct Operator<'a> {
    pixels: &'a [u8],
    width: usize,
    margin: usize,
    samples: &'a [Sample],
    points: u32,
}

impl Operator<'_> {
    #[inline]
    fn at(&self, row: isize, col: isize) -> f64 {
        self.pixels[row as usize * self.width + col as usize] as f64
    }

    fn accumulate_row(&self, row: usize, acc: &mut [u64]) {
        for col in self.margin..self.width - self.margin {
            acc[self.code(row as isize, col as isize)] += 1;
        }
    }

    fn code(&self, row: isize, col: isize) -> usize {
        let centre = self.at(row, col);
        let mut bits = 0u64;
        for (p, s) in self.samples.iter().enumerate() {
            let q00 = self.at(row + s.r0, col + s.c0);
            let q01 = self.at(row + s.r0, col + s.c1);
            let q10 = self.at(row + s.r1, col + s.c0);
            let q11 = self.at(row + s.r1, col + s.c1);
            // Difference form keeps a flat neighbourhood exactly flat.
            let top = q00 + s.dc * (q01 - q00);
            let bottom = q10 + s.dc * (q11 - q10);
            let value = top + s.dr * (bottom - top);
            if value >= centre {
                bits |= 1 << p;
            }
        }
        uniform_code(bits, self.points)
    }
}

/// Popcount for patterns with at most two 0/1 transitions along the circle,
/// `points + 1` for everything else.
fn uniform_code(bits: u64, points: u32) -> usize {
    let transitions = if points > 1 {
        let mask = (1u64 << (points - 1)) - 1;
        ((bits ^ (bits >> 1)) & mask).count_ones()
    } else {
        0
    };
    if transitions <= 2 {
        bits.count_ones() as usize
    } else {
        points as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_starts_on_positive_column_axis() {
        let s = circle(3, 24);
        assert_eq!(s.len(), 24);
        assert_eq!((s[0].r0, s[0].r1, s[0].c0, s[0].c1), (0, 0, 3, 3));
        assert_eq!(s[0].dr, 0.0);
        // quarter turn lands straight above the centre
        assert_eq!((s[6].r0, s[6].c0, s[6].c1), (-3, 0, 0));
    }

    #[test]
    fn circle_offsets_stay_within_radius() {
        for s in circle(3, 24) {
            for v in [s.r0, s.r1, s.c0, s.c1] {
                assert!((-3..=3).contains(&v));
            }
            assert!((0.0..1.0).contains(&s.dr));
            assert!((0.0..1.0).contains(&s.dc));
        }
    }

    #[test]
    fn uniform_codes() {
        assert_eq!(uniform_code(0, 8), 0);
        assert_eq!(uniform_code(0xFF, 8), 8);
        assert_eq!(uniform_code(0b0001_1100, 8), 3);
        // wraps around the end of the circle: still two transitions
        assert_eq!(uniform_code(0b1000_0001, 8), 2);
        assert_eq!(uniform_code(0b0101_0000, 8), 9);
        assert_eq!(uniform_code(u64::MAX, 64), 64);
        assert_eq!(uniform_code(1, 1), 1);
    }
}
