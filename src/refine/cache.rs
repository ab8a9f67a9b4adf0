use std::sync::Arc;

use crate::{
    assets::decode::ImageId,
    depth::normalize::DepthId,
    foundation::{core::Canvas, error::BehindTextResult},
    refine::refiner::{RefineOpts, RefinedDepth},
};

/// Identity of one refinement result.
///
/// Besides the depth and target sizes, the key carries content identities of the image and
/// the depth field, so a stale entry can never be served for a different input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefineKey {
    pub image: ImageId,
    pub depth: DepthId,
    pub depth_size: (usize, usize),
    pub target: Canvas,
    pub opts: RefineOpts,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefineCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

/// Single-entry memo of the last refinement, scoped to one editing session.
///
/// Slider drags re-request the same key on every frame; only the first request pays for the
/// guided filter.
#[derive(Debug, Default)]
pub struct RefinementCache {
    entry: Option<(RefineKey, Arc<RefinedDepth>)>,
    stats: RefineCacheStats,
}

impl RefinementCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result for `key`, or run `compute` and keep its output.
    pub fn get_or_refine(
        &mut self,
        key: RefineKey,
        compute: impl FnOnce() -> BehindTextResult<RefinedDepth>,
    ) -> BehindTextResult<Arc<RefinedDepth>> {
        if let Some((k, v)) = &self.entry
            && *k == key
        {
            self.stats.hits += 1;
            tracing::debug!(hits = self.stats.hits, "refinement cache hit");
            return Ok(Arc::clone(v));
        }

        self.stats.misses += 1;
        tracing::debug!(
            misses = self.stats.misses,
            target_w = key.target.width,
            target_h = key.target.height,
            "refinement cache miss"
        );
        let refined = Arc::new(compute()?);
        self.entry = Some((key, Arc::clone(&refined)));
        Ok(refined)
    }

    /// Drop the cached entry. Call whenever a new image or depth field is loaded.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            self.stats.invalidations += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn stats(&self) -> RefineCacheStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "../../tests/unit/refine/cache.rs"]
mod tests;
