use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    assets::decode::SourceImage,
    foundation::{core::Canvas, error::BehindTextResult},
    mask::{depth_mask::Mask, feather::blur_alpha},
};

/// Dilation radius applied to cutout alpha so the subject fully covers text edges.
pub const CUTOUT_DILATE_RADIUS: u32 = 4;

/// Background-removal collaborator: returns an RGBA image whose alpha marks the subject.
pub trait ForegroundCutout: Send {
    fn name(&self) -> &str;

    fn cutout(&mut self, image: &SourceImage) -> BehindTextResult<image::RgbaImage>;
}

/// Serves a cutout that was produced ahead of time and stored as an RGBA image file.
pub struct CutoutFileProvider {
    path: PathBuf,
}

impl CutoutFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ForegroundCutout for CutoutFileProvider {
    fn name(&self) -> &str {
        "cutout-file"
    }

    fn cutout(&mut self, _image: &SourceImage) -> BehindTextResult<image::RgbaImage> {
        let img = image::open(&self.path)
            .with_context(|| format!("open cutout '{}'", self.path.display()))?;
        Ok(img.to_rgba8())
    }
}

/// Which signal decides the foreground.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaskSource {
    /// Threshold refined depth (the default).
    #[default]
    Depth,
    /// Use a background-removal cutout.
    Cutout,
}

/// Build a foreground mask from a cutout at `target` size.
///
/// Alpha is resized, dilated with a circular element of radius `radius`, then feathered by a
/// one-pixel blur that may only grow coverage.
#[tracing::instrument(skip(cutout), fields(src_w = cutout.width(), src_h = cutout.height()))]
pub fn cutout_mask(
    cutout: &image::RgbaImage,
    target: Canvas,
    radius: u32,
) -> BehindTextResult<Mask> {
    let alpha = image::GrayImage::from_fn(cutout.width(), cutout.height(), |x, y| {
        image::Luma([cutout.get_pixel(x, y).0[3]])
    });
    let alpha = if alpha.dimensions() == (target.width, target.height) {
        alpha
    } else {
        image::imageops::resize(
            &alpha,
            target.width,
            target.height,
            image::imageops::FilterType::Triangle,
        )
    };

    let (w, h) = (target.width as usize, target.height as usize);
    let dilated = dilate_alpha(alpha.as_raw(), w, h, radius);
    let feathered = blur_alpha(&dilated, w, h, 1.0)?;
    let merged = dilated
        .iter()
        .zip(&feathered)
        .map(|(&d, &f)| d.max(f))
        .collect();
    Mask::from_alpha(target, merged)
}

/// Morphological dilation (max filter) with a circular structuring element. Out-of-range
/// neighbours are ignored.
pub fn dilate_alpha(src: &[u8], width: usize, height: usize, radius: u32) -> Vec<u8> {
    if radius == 0 || src.is_empty() {
        return src.to_vec();
    }
    let r = radius as isize;
    let offsets: Vec<(isize, isize)> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
        .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
        .collect();

    let mut out = vec![0u8; src.len()];
    out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, px) in row.iter_mut().enumerate() {
            let mut max = 0u8;
            for &(dx, dy) in &offsets {
                let sx = x as isize + dx;
                let sy = y as isize + dy;
                if sx < 0 || sy < 0 || sx >= width as isize || sy >= height as isize {
                    continue;
                }
                max = max.max(src[sy as usize * width + sx as usize]);
                if max == 255 {
                    break;
                }
            }
            *px = max;
        }
    });
    out
}

#[cfg(test)]
#[path = "../../tests/unit/mask/cutout.rs"]
mod tests;
