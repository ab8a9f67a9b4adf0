use std::path::Path;

use anyhow::Context;

use crate::{
    assets::decode::unpremultiply_rgba8_in_place,
    foundation::{
        core::Canvas,
        error::{BehindTextError, BehindTextResult},
    },
};

/// CPU-readable RGBA8 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl Default for FrameRGBA {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
            premultiplied: true,
        }
    }
}

impl FrameRGBA {
    /// Fully transparent premultiplied frame.
    pub fn transparent(canvas: Canvas) -> BehindTextResult<Self> {
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.rgba_len()?],
            premultiplied: true,
        })
    }

    pub fn canvas(&self) -> BehindTextResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    /// Reshape in place for `canvas`, keeping the allocation when it is large enough.
    pub fn resize(&mut self, canvas: Canvas) -> BehindTextResult<()> {
        let len = canvas.rgba_len()?;
        self.width = canvas.width;
        self.height = canvas.height;
        self.data.clear();
        self.data.resize(len, 0);
        self.premultiplied = true;
        Ok(())
    }

    /// Straight-alpha copy of the pixels.
    pub fn straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut out);
        }
        out
    }

    /// Encode as an 8-bit RGBA PNG.
    pub fn encode_png(&self) -> BehindTextResult<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.straight_rgba())
            .ok_or_else(|| BehindTextError::render("frame buffer does not match its size"))?;
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .context("encode png")?;
        Ok(out.into_inner())
    }

    pub fn save_png(&self, path: &Path) -> BehindTextResult<()> {
        let png = self.encode_png()?;
        std::fs::write(path, png).with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
