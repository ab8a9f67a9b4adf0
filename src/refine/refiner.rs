use rayon::prelude::*;

use crate::{
    depth::normalize::DepthField,
    filter::{
        edges::edge_strength,
        guided::{GuidedFilterParams, fast_guided_filter},
    },
    foundation::{
        core::Field,
        error::{BehindTextError, BehindTextResult},
    },
};

/// Two-scale refinement settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RefineOpts {
    pub coarse: GuidedFilterParams,
    pub fine: GuidedFilterParams,
    /// Multiplier applied to edge strength before it is used as the fine-pass weight.
    pub edge_gain: f32,
}

impl Default for RefineOpts {
    fn default() -> Self {
        Self {
            coarse: GuidedFilterParams::COARSE,
            fine: GuidedFilterParams::FINE,
            edge_gain: 3.0,
        }
    }
}

/// Edge-snapped depth and the edge map that produced it, both at target resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct RefinedDepth {
    pub depth: Field,
    pub edges: Field,
}

impl RefinedDepth {
    pub fn width(&self) -> usize {
        self.depth.width()
    }

    pub fn height(&self) -> usize {
        self.depth.height()
    }
}

/// Refine a normalized depth field against a luma guide at target resolution.
///
/// Coarse and fine guided-filter passes run in parallel; near strong guide edges the fine
/// estimate wins, in flat regions the coarse one does.
#[tracing::instrument(
    skip_all,
    fields(
        depth_w = depth.width(),
        depth_h = depth.height(),
        target_w = guide.width(),
        target_h = guide.height()
    )
)]
pub fn refine_depth(
    guide: &Field,
    depth: &DepthField,
    opts: &RefineOpts,
) -> BehindTextResult<RefinedDepth> {
    if guide.is_empty() {
        return Err(BehindTextError::validation("refinement guide is empty"));
    }

    let raw = depth.as_field();
    let ((coarse, fine), edges) = rayon::join(
        || {
            rayon::join(
                || fast_guided_filter(guide, raw, opts.coarse),
                || fast_guided_filter(guide, raw, opts.fine),
            )
        },
        || edge_strength(guide),
    );

    let gain = opts.edge_gain;
    let mut merged = vec![0f32; guide.len()];
    merged.par_iter_mut().enumerate().for_each(|(i, out)| {
        let e = (edges.data()[i] * gain).min(1.0);
        *out = e * fine.data()[i] + (1.0 - e) * coarse.data()[i];
    });

    Ok(RefinedDepth {
        depth: Field::from_raw(guide.width(), guide.height(), merged),
        edges,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/refine/refiner.rs"]
mod tests;
