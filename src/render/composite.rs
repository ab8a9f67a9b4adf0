//! Premultiplied RGBA8 blending.

use rayon::prelude::*;

use crate::foundation::{
    error::{BehindTextError, BehindTextResult},
    math::mul_div255_u8,
};

pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over on premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }
    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

/// Destination-in: keep `src` scaled by `mask` coverage.
pub fn keep_where(src: PremulRgba8, mask: u8) -> PremulRgba8 {
    match mask {
        0 => [0; 4],
        255 => src,
        m => src.map(|c| mul_div255_u8(u16::from(c), u16::from(m))),
    }
}

pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> BehindTextResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(BehindTextError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    dst.par_chunks_exact_mut(4)
        .zip(src.par_chunks_exact(4))
        .for_each(|(d, s)| {
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
            d.copy_from_slice(&out);
        });
    Ok(())
}

/// Write `src` masked by `mask` (one byte per pixel) into `dst`.
pub fn mask_into(dst: &mut [u8], src: &[u8], mask: &[u8]) -> BehindTextResult<()> {
    if dst.len() != src.len() || dst.len() != mask.len().saturating_mul(4) {
        return Err(BehindTextError::render(
            "mask_into expects rgba8 buffers matching the mask",
        ));
    }
    dst.par_chunks_exact_mut(4)
        .zip(src.par_chunks_exact(4))
        .zip(mask.par_iter())
        .for_each(|((d, s), &m)| {
            d.copy_from_slice(&keep_where([s[0], s[1], s[2], s[3]], m));
        });
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
