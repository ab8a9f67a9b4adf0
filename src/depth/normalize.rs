use crate::foundation::{
    core::Field,
    error::{BehindTextError, BehindTextResult},
};

/// Depth samples exactly as a provider returned them (arbitrary scale, higher = closer).
#[derive(Clone, Debug, PartialEq)]
pub struct RawDepth {
    /// Row-major samples.
    pub samples: Vec<f32>,
    /// Width of the depth grid.
    pub width: usize,
    /// Height of the depth grid.
    pub height: usize,
}

impl RawDepth {
    /// Build a raw depth grid, checking the sample count.
    pub fn new(samples: Vec<f32>, width: usize, height: usize) -> BehindTextResult<Self> {
        if width == 0 || height == 0 {
            return Err(BehindTextError::acquisition(format!(
                "depth provider returned an empty {width}x{height} map"
            )));
        }
        if samples.len() != width.saturating_mul(height) {
            return Err(BehindTextError::acquisition(format!(
                "depth provider returned {} samples for a {width}x{height} map",
                samples.len()
            )));
        }
        Ok(Self {
            samples,
            width,
            height,
        })
    }
}

/// Content identity of a normalized depth grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DepthId(pub(crate) u64);

/// Depth grid normalized to `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthField {
    field: Field,
    id: DepthId,
}

impl DepthField {
    /// Wrap a field whose values are already in `[0, 1]`. Values are clamped.
    pub fn from_normalized(field: Field) -> Self {
        Self::wrap(field.map(|v| {
            if v.is_finite() {
                v.clamp(0.0, 1.0)
            } else {
                0.0
            }
        }))
    }

    fn wrap(field: Field) -> Self {
        let mut hasher = xxhash_rust::xxh3::Xxh3::new();
        hasher.update(&(field.width() as u64).to_le_bytes());
        hasher.update(&(field.height() as u64).to_le_bytes());
        for v in field.data() {
            hasher.update(&v.to_bits().to_le_bytes());
        }
        let id = DepthId(hasher.digest());
        Self { field, id }
    }

    pub fn id(&self) -> DepthId {
        self.id
    }

    pub fn width(&self) -> usize {
        self.field.width()
    }

    pub fn height(&self) -> usize {
        self.field.height()
    }

    pub fn samples(&self) -> &[f32] {
        self.field.data()
    }

    pub fn as_field(&self) -> &Field {
        &self.field
    }
}

/// Linearly rescale raw depth so the minimum maps to 0 and the maximum to 1.
///
/// A flat map (max == min) uses a range of 1, so every sample becomes 0. Non-finite samples
/// are treated as the minimum.
pub fn normalize_depth(raw: &RawDepth) -> DepthField {
    let (lo, hi) = raw
        .samples
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let (lo, hi) = if lo.is_finite() { (lo, hi) } else { (0.0, 0.0) };
    let range = if hi > lo { hi - lo } else { 1.0 };

    let data = raw
        .samples
        .iter()
        .map(|&v| {
            if v.is_finite() {
                ((v - lo) / range).clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
        .collect();

    DepthField::wrap(Field::from_raw(raw.width, raw.height, data))
}

#[cfg(test)]
#[path = "../../tests/unit/depth/normalize.rs"]
mod tests;
