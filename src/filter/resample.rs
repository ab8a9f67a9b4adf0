//! Resampling primitives shared by the guided filter.
//!
//! All operations work on [`Field`] and allocate their output. Row loops run on rayon; every
//! output sample depends only on its inputs, so results do not depend on thread scheduling.

use rayon::prelude::*;

use crate::foundation::core::Field;

/// Windowed sum over a `(2r+1) x (2r+1)` box, clamped at the borders.
///
/// Border pixels use a smaller effective window (no wraparound, no zero padding). Runs in
/// `O(width * height)` independent of `radius`: the horizontal pass uses per-row prefix sums and
/// the vertical pass keeps a running column sum.
pub fn box_sum(src: &Field, radius: usize) -> Field {
    let (w, h) = (src.width(), src.height());
    let mut tmp = vec![0f64; w * h];

    tmp.par_chunks_mut(w)
        .zip(src.data().par_chunks(w))
        .for_each(|(dst_row, src_row)| {
            let mut prefix = vec![0f64; w + 1];
            for (x, &v) in src_row.iter().enumerate() {
                prefix[x + 1] = prefix[x] + f64::from(v);
            }
            for (x, out) in dst_row.iter_mut().enumerate() {
                let l = x.saturating_sub(radius);
                let r = (x + radius).min(w - 1);
                *out = prefix[r + 1] - prefix[l];
            }
        });

    let mut out = vec![0f32; w * h];
    let mut col = vec![0f64; w];
    for row in tmp.chunks_exact(w).take(radius.min(h - 1) + 1) {
        for (acc, &v) in col.iter_mut().zip(row) {
            *acc += v;
        }
    }
    for y in 0..h {
        for (o, &acc) in out[y * w..(y + 1) * w].iter_mut().zip(&col) {
            *o = acc as f32;
        }
        let enter = y + 1 + radius;
        if enter < h {
            for (acc, &v) in col.iter_mut().zip(&tmp[enter * w..(enter + 1) * w]) {
                *acc += v;
            }
        }
        if y >= radius && y + 1 < h {
            let leave = y - radius;
            for (acc, &v) in col.iter_mut().zip(&tmp[leave * w..(leave + 1) * w]) {
                *acc -= v;
            }
        }
    }

    Field::from_raw(w, h, out)
}

/// Number of samples that fall inside each clamped window of [`box_sum`].
pub fn box_count(width: usize, height: usize, radius: usize) -> Field {
    let span = |i: usize, n: usize| ((i + radius).min(n - 1) - i.saturating_sub(radius) + 1) as f32;
    let mut data = vec![0f32; width * height];
    data.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let sy = span(y, height);
        for (x, v) in row.iter_mut().enumerate() {
            *v = span(x, width) * sy;
        }
    });
    Field::from_raw(width, height, data)
}

/// Mean over the clamped `(2r+1)^2` window.
pub fn box_mean(src: &Field, radius: usize) -> Field {
    let sum = box_sum(src, radius);
    let count = box_count(src.width(), src.height(), radius);
    sum.zip_map(&count, |s, n| s / n)
}

/// Nearest-neighbour point sampling onto a grid `factor` times smaller.
///
/// The output is never smaller than 1x1. No averaging happens here; the guided filter smooths
/// the result again.
pub fn downsample(src: &Field, factor: f32) -> Field {
    let (sw, sh) = (src.width(), src.height());
    let factor = if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        1.0
    };
    let dw = ((sw as f32 / factor).round() as usize).max(1);
    let dh = ((sh as f32 / factor).round() as usize).max(1);

    let mut data = vec![0f32; dw * dh];
    data.par_chunks_mut(dw).enumerate().for_each(|(y, row)| {
        let sy = ((y as f32 * factor).round() as usize).min(sh - 1);
        for (x, v) in row.iter_mut().enumerate() {
            let sx = ((x as f32 * factor).round() as usize).min(sw - 1);
            *v = src.at(sx, sy);
        }
    });
    Field::from_raw(dw, dh, data)
}

/// Bilinear resize with corner-aligned sampling and edge clamping.
///
/// When the destination size equals the source size the output is an exact copy.
pub fn upsample_bilinear(src: &Field, dw: usize, dh: usize) -> Field {
    let (sw, sh) = (src.width(), src.height());
    let (dw, dh) = (dw.max(1), dh.max(1));
    if sw == dw && sh == dh {
        return src.clone();
    }

    let scale = |s: usize, d: usize| (s - 1) as f32 / (d.saturating_sub(1).max(1)) as f32;
    let sc_x = scale(sw, dw);
    let sc_y = scale(sh, dh);

    let mut data = vec![0f32; dw * dh];
    data.par_chunks_mut(dw).enumerate().for_each(|(y, row)| {
        let fy = y as f32 * sc_y;
        let y0 = (fy.floor() as usize).min(sh - 1);
        let y1 = (y0 + 1).min(sh - 1);
        let dy = fy - y0 as f32;
        for (x, v) in row.iter_mut().enumerate() {
            let fx = x as f32 * sc_x;
            let x0 = (fx.floor() as usize).min(sw - 1);
            let x1 = (x0 + 1).min(sw - 1);
            let dx = fx - x0 as f32;
            *v = src.at(x0, y0) * (1.0 - dx) * (1.0 - dy)
                + src.at(x1, y0) * dx * (1.0 - dy)
                + src.at(x0, y1) * (1.0 - dx) * dy
                + src.at(x1, y1) * dx * dy;
        }
    });
    Field::from_raw(dw, dh, data)
}

#[cfg(test)]
#[path = "../../tests/unit/filter/resample.rs"]
mod tests;
