//! Fast guided filter (He & Sun): a locally linear model `q = a * I + b` fit on a subsampled
//! grid and applied at full resolution.

use rayon::prelude::*;

use crate::{
    filter::resample::{box_count, box_sum, downsample, upsample_bilinear},
    foundation::core::Field,
};

/// Parameters for one guided-filter pass, expressed at target resolution.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GuidedFilterParams {
    /// Window radius in target pixels.
    pub radius: u32,
    /// Regularization added to the guide variance.
    pub eps: f32,
    /// Subsampling factor applied before computing local statistics.
    pub subsample: f32,
}

impl GuidedFilterParams {
    /// Large window, strong regularization: stable global structure.
    pub const COARSE: Self = Self {
        radius: 16,
        eps: 0.04,
        subsample: 8.0,
    };

    /// Small window, weak regularization: sharp local detail.
    pub const FINE: Self = Self {
        radius: 4,
        eps: 0.005,
        subsample: 2.0,
    };

    fn sub_radius(self) -> usize {
        ((self.radius as f32 / self.subsample.max(1e-3)).round() as usize).max(1)
    }
}

/// Refine `depth` against `guide`, returning a field at guide resolution clamped to `[0, 1]`.
///
/// `depth` may have any resolution; it is bilinearly resized to the guide size first.
pub fn fast_guided_filter(guide: &Field, depth: &Field, params: GuidedFilterParams) -> Field {
    let (gw, gh) = (guide.width(), guide.height());
    let p_full = upsample_bilinear(depth, gw, gh);
    let g_sub = downsample(guide, params.subsample);
    let p_sub = downsample(&p_full, params.subsample);
    let (sw, sh) = (g_sub.width(), g_sub.height());
    let r = params.sub_radius();

    let n = box_count(sw, sh, r);
    let mean_i = box_sum(&g_sub, r);
    let mean_p = box_sum(&p_sub, r);
    let mean_ip = box_sum(&g_sub.zip_map(&p_sub, |i, p| i * p), r);
    let mean_ii = box_sum(&g_sub.map(|i| i * i), r);

    let mut a = vec![0f32; sw * sh];
    let mut b = vec![0f32; sw * sh];
    a.par_iter_mut()
        .zip(b.par_iter_mut())
        .enumerate()
        .for_each(|(i, (a, b))| {
            let count = n.data()[i];
            let m_i = mean_i.data()[i] / count;
            let m_p = mean_p.data()[i] / count;
            let cov_ip = mean_ip.data()[i] / count - m_i * m_p;
            let var_i = mean_ii.data()[i] / count - m_i * m_i;
            let denom = var_i + params.eps;
            *a = if denom > f32::EPSILON {
                cov_ip / denom
            } else {
                0.0
            };
            *b = m_p - *a * m_i;
        });

    let a = Field::from_raw(sw, sh, a);
    let b = Field::from_raw(sw, sh, b);
    let mean_a = box_sum(&a, r).zip_map(&n, |s, c| s / c);
    let mean_b = box_sum(&b, r).zip_map(&n, |s, c| s / c);

    let a_up = upsample_bilinear(&mean_a, gw, gh);
    let b_up = upsample_bilinear(&mean_b, gw, gh);

    let mut out = vec![0f32; gw * gh];
    out.par_iter_mut().enumerate().for_each(|(i, v)| {
        *v = (a_up.data()[i] * guide.data()[i] + b_up.data()[i]).clamp(0.0, 1.0);
    });
    Field::from_raw(gw, gh, out)
}

#[cfg(test)]
#[path = "../../tests/unit/filter/guided.rs"]
mod tests;
