use std::sync::Arc;

use anyhow::Context;
use rayon::prelude::*;

use crate::foundation::{
    core::{Canvas, Field},
    error::{BehindTextError, BehindTextResult},
    math::mul_div255_u8,
};

/// Content identity of a decoded image (xxh3 over dimensions and pixels).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub(crate) u64);

impl ImageId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Decoded input photograph. Immutable once loaded; the pipeline never mutates it.
#[derive(Clone, Debug)]
pub struct SourceImage {
    rgba: Arc<image::RgbaImage>,
    channels: u8,
    id: ImageId,
}

/// Source image resampled to a render target, in both alpha conventions.
#[derive(Clone, Debug)]
pub struct ResizedImage {
    /// Target size.
    pub canvas: Canvas,
    /// Straight-alpha RGBA8.
    pub straight: Vec<u8>,
    /// Premultiplied RGBA8.
    pub premul: Vec<u8>,
}

impl SourceImage {
    /// Wrap straight-alpha RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> BehindTextResult<Self> {
        let canvas = Canvas::new(width, height)?;
        if data.len() != canvas.rgba_len()? {
            return Err(BehindTextError::validation(format!(
                "rgba buffer length {} does not match {width}x{height}",
                data.len()
            )));
        }
        let rgba = image::RgbaImage::from_raw(width, height, data)
            .ok_or_else(|| BehindTextError::validation("rgba buffer rejected by image crate"))?;
        Ok(Self::from_rgba_image(rgba, 4))
    }

    fn from_rgba_image(rgba: image::RgbaImage, channels: u8) -> Self {
        let id = image_id(&rgba);
        Self {
            rgba: Arc::new(rgba),
            channels,
            id,
        }
    }

    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.rgba.width(),
            height: self.rgba.height(),
        }
    }

    /// Channel count of the encoded source (3 or 4).
    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn rgba(&self) -> &image::RgbaImage {
        &self.rgba
    }

    /// Resample to `canvas` (triangle filter). Native size is copied verbatim.
    pub fn resize_to(&self, canvas: Canvas) -> ResizedImage {
        let straight = if canvas == self.canvas() {
            self.rgba.as_raw().clone()
        } else {
            image::imageops::resize(
                self.rgba.as_ref(),
                canvas.width,
                canvas.height,
                image::imageops::FilterType::Triangle,
            )
            .into_raw()
        };
        let mut premul = straight.clone();
        premultiply_rgba8_in_place(&mut premul);
        ResizedImage {
            canvas,
            straight,
            premul,
        }
    }
}

impl ResizedImage {
    /// Grayscale guide: `0.299 R + 0.587 G + 0.114 B`, scaled to `[0, 1]`.
    pub fn luma_guide(&self) -> Field {
        let w = self.canvas.width as usize;
        let h = self.canvas.height as usize;
        let data = self
            .straight
            .par_chunks_exact(4)
            .map(|px| {
                (0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2]))
                    / 255.0
            })
            .collect();
        Field::from_raw(w, h, data)
    }
}

/// Decode JPEG, PNG or WebP bytes.
pub fn decode_image(bytes: &[u8]) -> BehindTextResult<SourceImage> {
    let format = image::guess_format(bytes).map_err(|_| unsupported_input())?;
    if !matches!(
        format,
        image::ImageFormat::Jpeg | image::ImageFormat::Png | image::ImageFormat::WebP
    ) {
        return Err(unsupported_input());
    }

    let dyn_img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| BehindTextError::acquisition(format!("could not decode image: {e}")))?;
    let channels = dyn_img.color().channel_count();
    let rgba = dyn_img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(BehindTextError::acquisition("decoded image is empty"));
    }
    Ok(SourceImage::from_rgba_image(rgba, channels))
}

/// Read and decode an image file, rejecting files larger than `max_bytes`.
pub fn load_image_file(
    path: &std::path::Path,
    max_bytes: Option<u64>,
) -> BehindTextResult<SourceImage> {
    if let Some(max) = max_bytes {
        let len = std::fs::metadata(path)
            .with_context(|| format!("stat image '{}'", path.display()))?
            .len();
        if len > max {
            return Err(BehindTextError::validation(format!(
                "image '{}' is {len} bytes, above the {max} byte limit",
                path.display()
            )));
        }
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

fn unsupported_input() -> BehindTextError {
    BehindTextError::acquisition(
        "Could not decode image. Make sure the input is a valid JPEG, PNG, or WebP.",
    )
}

fn image_id(rgba: &image::RgbaImage) -> ImageId {
    let mut hasher = xxhash_rust::xxh3::Xxh3::new();
    hasher.update(&rgba.width().to_le_bytes());
    hasher.update(&rgba.height().to_le_bytes());
    hasher.update(rgba.as_raw());
    ImageId(hasher.digest())
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u8(u16::from(px[0]), a);
        px[1] = mul_div255_u8(u16::from(px[1]), a);
        px[2] = mul_div255_u8(u16::from(px[2]), a);
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
