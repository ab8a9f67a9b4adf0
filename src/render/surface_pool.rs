use std::collections::HashMap;

use crate::foundation::{core::Canvas, error::BehindTextResult};

/// Retention limits for pooled scratch surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SurfacePoolOpts {
    /// Maximum bytes retained across all buckets.
    pub max_pool_bytes: usize,
    /// Maximum number of retained surfaces per size bucket.
    pub max_surfaces_per_bucket: usize,
}

impl Default for SurfacePoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 256 * 1024 * 1024,
            max_surfaces_per_bucket: 2,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SurfacePoolStats {
    pub retained_surfaces: usize,
    pub retained_bytes: usize,
    pub alloc_surfaces: u64,
    pub alloc_bytes: u64,
    pub reused_surfaces: u64,
    pub dropped_on_release: u64,
}

/// Premultiplied RGBA8 scratch buffer borrowed from a [`RenderSurfacePool`].
#[derive(Debug)]
pub struct Surface {
    canvas: Canvas,
    data: Vec<u8>,
}

impl Surface {
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

/// Caller-owned allocator for the compositor's scratch layers.
///
/// Buckets are keyed by canvas size. Borrowed surfaces have unspecified contents; callers
/// overwrite or [`Surface::clear`] them. A pool with zero caps never retains anything, which is
/// how one-shot exports run.
#[derive(Debug)]
pub struct RenderSurfacePool {
    opts: SurfacePoolOpts,
    stats: SurfacePoolStats,
    buckets: HashMap<Canvas, Vec<Vec<u8>>>,
}

impl RenderSurfacePool {
    pub fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            opts,
            stats: SurfacePoolStats::default(),
            buckets: HashMap::new(),
        }
    }

    /// A pool that allocates fresh surfaces on every borrow.
    pub fn unpooled() -> Self {
        Self::new(SurfacePoolOpts {
            max_pool_bytes: 0,
            max_surfaces_per_bucket: 0,
        })
    }

    pub fn stats(&self) -> SurfacePoolStats {
        self.stats
    }

    pub fn borrow(&mut self, canvas: Canvas) -> BehindTextResult<Surface> {
        let bytes = canvas.rgba_len()?;
        if let Some(data) = self.buckets.get_mut(&canvas).and_then(Vec::pop) {
            self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(bytes);
            self.stats.reused_surfaces = self.stats.reused_surfaces.saturating_add(1);
            return Ok(Surface { canvas, data });
        }

        self.stats.alloc_surfaces = self.stats.alloc_surfaces.saturating_add(1);
        self.stats.alloc_bytes = self.stats.alloc_bytes.saturating_add(bytes as u64);
        Ok(Surface {
            canvas,
            data: vec![0; bytes],
        })
    }

    pub fn release(&mut self, surface: Surface) {
        let bytes = surface.data.len();
        if self.opts.max_pool_bytes == 0
            || self.opts.max_surfaces_per_bucket == 0
            || self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes
        {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bucket = self.buckets.entry(surface.canvas).or_default();
        if bucket.len() >= self.opts.max_surfaces_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }
        bucket.push(surface.data);
        self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }

    /// Drop every retained surface whose size is not `canvas`.
    pub fn resize(&mut self, canvas: Canvas) {
        let before = self.stats.retained_surfaces;
        self.buckets.retain(|k, _| *k == canvas);
        self.recount();
        if self.stats.retained_surfaces != before {
            tracing::debug!(
                width = canvas.width,
                height = canvas.height,
                dropped = before - self.stats.retained_surfaces,
                "surface pool resized"
            );
        }
    }

    /// Drop every retained surface.
    pub fn reset(&mut self) {
        self.buckets.clear();
        self.recount();
    }

    fn recount(&mut self) {
        self.stats.retained_surfaces = self.buckets.values().map(Vec::len).sum();
        self.stats.retained_bytes = self
            .buckets
            .values()
            .flat_map(|b| b.iter().map(Vec::len))
            .sum();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface_pool.rs"]
mod tests;
