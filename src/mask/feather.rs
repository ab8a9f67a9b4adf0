//! Separable gaussian blur on single-channel coverage, Q16 fixed-point weights.

use rayon::prelude::*;

use crate::foundation::error::{BehindTextError, BehindTextResult};

/// Blur an 8-bit alpha plane. Borders clamp. `sigma` of zero returns a copy.
pub fn blur_alpha(
    src: &[u8],
    width: usize,
    height: usize,
    sigma: f32,
) -> BehindTextResult<Vec<u8>> {
    if src.len() != width.saturating_mul(height) {
        return Err(BehindTextError::validation(
            "blur_alpha expects src matching width*height",
        ));
    }
    if sigma == 0.0 || src.is_empty() {
        return Ok(src.to_vec());
    }
    let kernel = gaussian_kernel_q16(sigma)?;
    let r = kernel.len() / 2;

    let mut tmp = vec![0u8; src.len()];
    tmp.par_chunks_mut(width)
        .zip(src.par_chunks(width))
        .for_each(|(dst, row)| {
            for (x, out) in dst.iter_mut().enumerate() {
                let acc: u64 = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| {
                        let sx = (x + k).saturating_sub(r).min(width - 1);
                        u64::from(w) * u64::from(row[sx])
                    })
                    .sum();
                *out = q16_to_u8(acc);
            }
        });

    let mut out = vec![0u8; src.len()];
    out.par_chunks_mut(width).enumerate().for_each(|(y, dst)| {
        for (x, px) in dst.iter_mut().enumerate() {
            let acc: u64 = kernel
                .iter()
                .enumerate()
                .map(|(k, &w)| {
                    let sy = (y + k).saturating_sub(r).min(height - 1);
                    u64::from(w) * u64::from(tmp[sy * width + x])
                })
                .sum();
            *px = q16_to_u8(acc);
        }
    });
    Ok(out)
}

/// Normalized gaussian taps over `ceil(3 sigma)` on each side, summing exactly to `1 << 16`.
fn gaussian_kernel_q16(sigma: f32) -> BehindTextResult<Vec<u32>> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(BehindTextError::validation("blur sigma must be >= 0"));
    }
    let r = (3.0 * sigma).ceil().max(1.0) as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| (-f64::from(i * i) / denom).exp())
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let mid = weights.len() / 2;
    weights[mid] = (i64::from(weights[mid]) + 65536 - acc).clamp(0, 65536) as u32;
    Ok(weights)
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/mask/feather.rs"]
mod tests;
