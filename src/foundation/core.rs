use crate::foundation::error::{BehindTextError, BehindTextResult};

pub use kurbo::{Affine, Vec2};

/// Pixel dimensions of a raster target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Build a canvas, rejecting zero-sized dimensions.
    pub fn new(width: u32, height: u32) -> BehindTextResult<Self> {
        if width == 0 || height == 0 {
            return Err(BehindTextError::validation(format!(
                "canvas must be non-empty, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels.
    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> BehindTextResult<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| BehindTextError::validation("rgba buffer size overflow"))
    }
}

/// Single-channel `f32` grid stored row-major.
///
/// Used for depth, guide, edge-strength and filter intermediates. Dimensions are always
/// non-zero and `data.len() == width * height`.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Field {
    /// Wrap an existing buffer, checking its length against the dimensions.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> BehindTextResult<Self> {
        if width == 0 || height == 0 {
            return Err(BehindTextError::validation(format!(
                "field must be non-empty, got {width}x{height}"
            )));
        }
        let expected = width
            .checked_mul(height)
            .ok_or_else(|| BehindTextError::validation("field size overflow"))?;
        if data.len() != expected {
            return Err(BehindTextError::validation(format!(
                "field buffer length {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap a buffer whose length the caller has already sized to `width * height`.
    pub(crate) fn from_raw(width: usize, height: usize, data: Vec<f32>) -> Self {
        debug_assert!(width > 0 && height > 0);
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// Field of the given size filled with `value`.
    ///
    /// Zero dimensions are bumped to 1 so the non-empty invariant holds.
    pub fn new_fill(width: usize, height: usize, value: f32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn same_shape(&self, other: &Field) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Smallest and largest sample.
    pub fn min_max(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Element-wise map into a new field of the same shape.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Field {
        Field {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Element-wise combination of two same-shaped fields.
    pub fn zip_map(&self, other: &Field, f: impl Fn(f32, f32) -> f32) -> Field {
        debug_assert!(self.same_shape(other));
        Field {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
