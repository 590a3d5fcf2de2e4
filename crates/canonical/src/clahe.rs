//! Contrast-limited adaptive histogram equalization.
//!
//! Each tile gets its own clipped, cumulative lookup table; every output
//! sample is a bilinear blend of the four tables whose tile centres surround
//! it, which keeps tile seams invisible.

const BINS: usize = 256;

/// Equalize a single-channel plane of `width * height` samples.
pub(crate) fn equalize(
    src: &[u8],
    width: usize,
    height: usize,
    tile_grid: u32,
    clip_limit: f32,
) -> Vec<u8> {
    let grid = tile_grid.max(1) as usize;
    let tile_w = width.div_ceil(grid).max(1);
    let tile_h = height.div_ceil(grid).max(1);
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = vec![[0u8; BINS]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts[ty * tiles_x + tx] = tile_lut(src, width, (x0, x1), (y0, y1), clip_limit);
        }
    }

    let cols: Vec<(usize, usize, f32)> = (0..width)
        .map(|x| interpolation_cell(x, tile_w, tiles_x))
        .collect();

    let mut out = vec![0u8; width * height];
    for y in 0..height {
        let (ty1, ty2, ya) = interpolation_cell(y, tile_h, tiles_y);
        let row_in = &src[y * width..(y + 1) * width];
        let row_out = &mut out[y * width..(y + 1) * width];
        for (x, (&v, dst)) in row_in.iter().zip(row_out.iter_mut()).enumerate() {
            let (tx1, tx2, xa) = cols[x];
            let v = v as usize;
            let top = luts[ty1 * tiles_x + tx1][v] as f32 * (1.0 - xa)
                + luts[ty1 * tiles_x + tx2][v] as f32 * xa;
            let bottom = luts[ty2 * tiles_x + tx1][v] as f32 * (1.0 - xa)
                + luts[ty2 * tiles_x + tx2][v] as f32 * xa;
            let blended = top * (1.0 - ya) + bottom * ya;
            *dst = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Neighbouring tile indices and blend weight for one coordinate.
fn interpolation_cell(pos: usize, tile: usize, tiles: usize) -> (usize, usize, f32) {
    let f = pos as f32 / tile as f32 - 0.5;
    let lo = f.floor();
    let weight = f - lo;
    let last = tiles as isize - 1;
    let first = (lo as isize).clamp(0, last) as usize;
    let second = (lo as isize + 1).clamp(0, last) as usize;
    (first, second, weight)
}

fn tile_lut(
    src: &[u8],
    width: usize,
    (x0, x1): (usize, usize),
    (y0, y1): (usize, usize),
    clip_limit: f32,
) -> [u8; BINS] {
    let mut hist = [0u32; BINS];
    for y in y0..y1 {
        for &v in &src[y * width + x0..y * width + x1] {
            hist[v as usize] += 1;
        }
    }

    let area = ((x1 - x0) * (y1 - y0)) as u32;
    if clip_limit > 0.0 {
        let clip = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);
        clip_histogram(&mut hist, clip);
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; BINS];
    let mut cumulative = 0u32;
    for (slot, &count) in lut.iter_mut().zip(hist.iter()) {
        cumulative += count;
        *slot = (cumulative as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Cap every bin at `clip` and spread the excess evenly; what does not
/// divide evenly is handed out one sample at a time at a fixed stride.
fn clip_histogram(hist: &mut [u32; BINS], clip: u32) {
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }

    let batch = excess / BINS as u32;
    let residual = (excess % BINS as u32) as usize;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (BINS / residual).max(1);
        for bin in hist.iter_mut().step_by(step).take(residual) {
            *bin += 1;
        }
    }
}
