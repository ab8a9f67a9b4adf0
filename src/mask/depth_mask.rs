use rayon::prelude::*;

use crate::{
    foundation::{
        core::Canvas,
        error::{BehindTextError, BehindTextResult},
        math::smoothstep01,
    },
    refine::refiner::RefinedDepth,
};

/// Edge-adaptive softness settings for depth thresholding.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MaskOpts {
    /// Width of the transition band (in normalized depth) where there are no edges.
    pub base_softness: f32,
    /// How much a full-strength edge narrows the band (0 = not at all, 1 = to a hard cut).
    pub edge_sharpening: f32,
}

impl Default for MaskOpts {
    fn default() -> Self {
        Self {
            base_softness: 0.06,
            edge_sharpening: 0.85,
        }
    }
}

/// Single-channel foreground coverage at target resolution. 255 = subject drawn over text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    canvas: Canvas,
    alpha: Vec<u8>,
}

impl Mask {
    pub fn from_alpha(canvas: Canvas, alpha: Vec<u8>) -> BehindTextResult<Self> {
        if alpha.len() != canvas.pixel_count() {
            return Err(BehindTextError::validation(format!(
                "mask has {} samples for {}x{}",
                alpha.len(),
                canvas.width,
                canvas.height
            )));
        }
        Ok(Self { canvas, alpha })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn alpha(&self) -> &[u8] {
        &self.alpha
    }

    pub fn alpha_mut(&mut self) -> &mut [u8] {
        &mut self.alpha
    }

    /// Straight-alpha white RGBA8 carrying the mask in the alpha channel.
    pub fn to_rgba_white(&self) -> Vec<u8> {
        self.alpha
            .iter()
            .flat_map(|&a| [255, 255, 255, a])
            .collect()
    }

    pub fn to_gray_image(&self) -> image::GrayImage {
        let w = self.canvas.width as usize;
        image::GrayImage::from_fn(self.canvas.width, self.canvas.height, |x, y| {
            image::Luma([self.alpha[y as usize * w + x as usize]])
        })
    }
}

/// Alpha for one pixel given refined depth, edge strength and a normalized threshold `t`.
///
/// Non-decreasing in `depth` and continuous across the soft band.
pub fn mask_alpha(depth: f32, edge: f32, t: f32, opts: &MaskOpts) -> u8 {
    let softness = opts.base_softness * (1.0 - edge.clamp(0.0, 1.0) * opts.edge_sharpening);
    if softness <= f32::EPSILON {
        return if depth >= t { 255 } else { 0 };
    }
    let half = softness * 0.5;
    if depth >= t + half {
        255
    } else if depth <= t - half {
        0
    } else {
        let e = (depth - (t - half)) / softness;
        (255.0 * smoothstep01(e)).round() as u8
    }
}

/// Threshold refined depth into a soft foreground mask. `threshold` is on the 0–255 scale.
#[tracing::instrument(skip(refined, opts), fields(w = refined.width(), h = refined.height()))]
pub fn depth_mask(
    refined: &RefinedDepth,
    threshold: f32,
    opts: &MaskOpts,
) -> BehindTextResult<Mask> {
    if !threshold.is_finite() {
        return Err(BehindTextError::validation("mask threshold must be finite"));
    }
    let t = threshold.clamp(0.0, 255.0) / 255.0;
    let canvas = Canvas::new(refined.width() as u32, refined.height() as u32)?;

    let alpha = refined
        .depth
        .data()
        .par_iter()
        .zip(refined.edges.data().par_iter())
        .map(|(&d, &e)| mask_alpha(d, e, t, opts))
        .collect();
    Ok(Mask { canvas, alpha })
}

#[cfg(test)]
#[path = "../../tests/unit/mask/depth_mask.rs"]
mod tests;
