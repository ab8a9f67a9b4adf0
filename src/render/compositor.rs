use std::sync::Arc;

use crate::{
    assets::decode::{ResizedImage, SourceImage},
    depth::normalize::DepthField,
    foundation::{
        core::Canvas,
        error::{BehindTextError, BehindTextResult},
    },
    mask::{
        cutout::{CUTOUT_DILATE_RADIUS, MaskSource, cutout_mask},
        depth_mask::{Mask, MaskOpts, depth_mask},
    },
    refine::{
        cache::{RefineCacheStats, RefineKey, RefinementCache},
        refiner::{RefineOpts, RefinedDepth, refine_depth},
    },
    render::{
        composite::{mask_into, over_in_place},
        frame::FrameRGBA,
        surface_pool::{RenderSurfacePool, SurfacePoolOpts, SurfacePoolStats},
    },
    text::{
        params::TextOverlayParams,
        raster::TextRasterizer,
        svg::{REFERENCE_WIDTH, WATERMARK_TEXT, render_scale, text_layer_svg, watermark_svg},
    },
};

/// Compositor configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompositorOpts {
    /// Canvas width at which text sizes are authored.
    pub reference_width: f64,
    /// Upper bound applied to the preview device pixel ratio.
    pub max_device_pixel_ratio: f64,
    pub watermark_text: String,
    pub cutout_dilate_radius: u32,
    pub pool: SurfacePoolOpts,
    pub refine: RefineOpts,
    pub mask: MaskOpts,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            reference_width: REFERENCE_WIDTH,
            max_device_pixel_ratio: 3.0,
            watermark_text: WATERMARK_TEXT.to_owned(),
            cutout_dilate_radius: CUTOUT_DILATE_RADIUS,
            pool: SurfacePoolOpts::default(),
            refine: RefineOpts::default(),
            mask: MaskOpts::default(),
        }
    }
}

/// Where a composite is headed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Interactive frame: pooled scratch surfaces and the session refinement cache.
    Preview,
    /// One-shot full-resolution render: fresh surfaces, no shared state.
    Export { watermark: bool },
}

/// Everything a single composite reads. Nothing here is mutated.
#[derive(Clone, Copy, Debug)]
pub struct LayerInputs<'a> {
    pub image: &'a SourceImage,
    pub params: &'a TextOverlayParams,
    pub depth: Option<&'a DepthField>,
    pub cutout: Option<&'a image::RgbaImage>,
}

impl LayerInputs<'_> {
    /// Depth wins over a cutout when both are present.
    pub fn mask_source(&self) -> Option<MaskSource> {
        if self.depth.is_some() {
            Some(MaskSource::Depth)
        } else if self.cutout.is_some() {
            Some(MaskSource::Cutout)
        } else {
            None
        }
    }
}

/// Image fitted inside a container: aspect preserved, never upscaled.
pub fn fit_to_container(
    image: Canvas,
    container_width: f64,
    container_height: f64,
) -> BehindTextResult<Canvas> {
    if !(container_width.is_finite() && container_height.is_finite())
        || container_width <= 0.0
        || container_height <= 0.0
    {
        return Err(BehindTextError::validation(format!(
            "container must be positive, got {container_width}x{container_height}"
        )));
    }
    let iw = f64::from(image.width);
    let ih = f64::from(image.height);
    let scale = (container_width / iw).min(container_height / ih).min(1.0);
    Canvas::new(
        ((iw * scale).round() as u32).max(1),
        ((ih * scale).round() as u32).max(1),
    )
}

/// Backing-store size of a preview: the fitted size times the capped pixel ratio.
pub fn preview_canvas(
    image: Canvas,
    container_width: f64,
    container_height: f64,
    device_pixel_ratio: f64,
    max_device_pixel_ratio: f64,
) -> BehindTextResult<Canvas> {
    let fitted = fit_to_container(image, container_width, container_height)?;
    let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(max_device_pixel_ratio)
    } else {
        1.0
    };
    Canvas::new(
        ((f64::from(fitted.width) * dpr).floor() as u32).max(1),
        ((f64::from(fitted.height) * dpr).floor() as u32).max(1),
    )
}

/// Draws background, text and masked foreground into a frame.
///
/// Owns the preview scratch pool and the refinement cache for one editing session.
#[derive(Debug)]
pub struct Compositor {
    opts: CompositorOpts,
    rasterizer: TextRasterizer,
    pool: RenderSurfacePool,
    cache: RefinementCache,
    refine_calls: u64,
}

impl Compositor {
    pub fn new(opts: CompositorOpts, rasterizer: TextRasterizer) -> Self {
        let pool = RenderSurfacePool::new(opts.pool);
        Self {
            opts,
            rasterizer,
            pool,
            cache: RefinementCache::new(),
            refine_calls: 0,
        }
    }

    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    pub fn rasterizer(&self) -> &TextRasterizer {
        &self.rasterizer
    }

    pub fn cache_stats(&self) -> RefineCacheStats {
        self.cache.stats()
    }

    pub fn pool_stats(&self) -> SurfacePoolStats {
        self.pool.stats()
    }

    /// Number of times the guided-filter refinement actually ran.
    pub fn refine_calls(&self) -> u64 {
        self.refine_calls
    }

    /// Forget everything tied to the current image or depth field.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
        self.pool.reset();
    }

    /// Composite `inputs` at `target` into `out`, which is resized to fit.
    ///
    /// A failure while building or applying the foreground mask is logged and the frame falls
    /// back to image plus text.
    #[tracing::instrument(
        skip_all,
        fields(w = target.width, h = target.height, mode = ?mode, mask = ?inputs.mask_source())
    )]
    pub fn compose_into(
        &mut self,
        inputs: &LayerInputs<'_>,
        target: Canvas,
        mode: RenderMode,
        out: &mut FrameRGBA,
    ) -> BehindTextResult<()> {
        let Self {
            opts,
            rasterizer,
            pool,
            cache,
            refine_calls,
        } = self;

        let mut fresh_pool;
        let (pool, cache) = match mode {
            RenderMode::Preview => {
                pool.resize(target);
                (pool, Some(cache))
            }
            RenderMode::Export { .. } => {
                fresh_pool = RenderSurfacePool::unpooled();
                (&mut fresh_pool, None)
            }
        };

        out.resize(target)?;
        let resized = inputs.image.resize_to(target);
        out.data.copy_from_slice(&resized.premul);

        let scale = render_scale(target, opts.reference_width);
        let text_svg = text_layer_svg(inputs.params, target, scale);
        draw_svg_layer(rasterizer, pool, &text_svg, target, &mut out.data)?;

        let foreground = match foreground_mask(opts, cache, refine_calls, inputs, &resized) {
            Ok(Some(mask)) => draw_masked_foreground(pool, &resized, &mask, &mut out.data),
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = foreground {
            tracing::warn!(error = %e, "foreground mask failed, rendering image and text only");
        }

        if let RenderMode::Export { watermark: true } = mode {
            let svg = watermark_svg(&opts.watermark_text, target);
            draw_svg_layer(rasterizer, pool, &svg, target, &mut out.data)?;
        }

        tracing::debug!(pool = ?pool.stats(), "composite done");
        Ok(())
    }

    /// Compose into a new frame.
    pub fn compose(
        &mut self,
        inputs: &LayerInputs<'_>,
        target: Canvas,
        mode: RenderMode,
    ) -> BehindTextResult<FrameRGBA> {
        let mut out = FrameRGBA::default();
        self.compose_into(inputs, target, mode, &mut out)?;
        Ok(out)
    }

    /// The foreground mask alone, at `target` size (cached like a preview).
    pub fn mask(
        &mut self,
        inputs: &LayerInputs<'_>,
        target: Canvas,
    ) -> BehindTextResult<Option<Mask>> {
        let resized = inputs.image.resize_to(target);
        foreground_mask(
            &self.opts,
            Some(&mut self.cache),
            &mut self.refine_calls,
            inputs,
            &resized,
        )
    }
}

fn draw_svg_layer(
    rasterizer: &TextRasterizer,
    pool: &mut RenderSurfacePool,
    svg: &str,
    target: Canvas,
    dst: &mut [u8],
) -> BehindTextResult<()> {
    let mut layer = pool.borrow(target)?;
    let res = rasterizer
        .rasterize_into(svg, target, layer.data_mut())
        .and_then(|()| over_in_place(dst, layer.data()));
    pool.release(layer);
    res
}

fn draw_masked_foreground(
    pool: &mut RenderSurfacePool,
    resized: &ResizedImage,
    mask: &Mask,
    dst: &mut [u8],
) -> BehindTextResult<()> {
    if mask.canvas() != resized.canvas {
        return Err(BehindTextError::render("mask size does not match target"));
    }
    let mut fg = pool.borrow(resized.canvas)?;
    let res = mask_into(fg.data_mut(), &resized.premul, mask.alpha())
        .and_then(|()| over_in_place(dst, fg.data()));
    pool.release(fg);
    res
}

fn foreground_mask(
    opts: &CompositorOpts,
    cache: Option<&mut RefinementCache>,
    refine_calls: &mut u64,
    inputs: &LayerInputs<'_>,
    resized: &ResizedImage,
) -> BehindTextResult<Option<Mask>> {
    match (inputs.mask_source(), inputs.depth, inputs.cutout) {
        (Some(MaskSource::Depth), Some(depth), _) => {
            let refined = refined_depth(opts, cache, refine_calls, inputs.image, depth, resized)?;
            depth_mask(&refined, inputs.params.depth_threshold, &opts.mask).map(Some)
        }
        (Some(MaskSource::Cutout), _, Some(cutout)) => {
            cutout_mask(cutout, resized.canvas, opts.cutout_dilate_radius).map(Some)
        }
        _ => Ok(None),
    }
}

fn refined_depth(
    opts: &CompositorOpts,
    cache: Option<&mut RefinementCache>,
    refine_calls: &mut u64,
    image: &SourceImage,
    depth: &DepthField,
    resized: &ResizedImage,
) -> BehindTextResult<Arc<RefinedDepth>> {
    let mut compute = || {
        *refine_calls += 1;
        refine_depth(&resized.luma_guide(), depth, &opts.refine)
    };
    match cache {
        Some(cache) => cache.get_or_refine(
            RefineKey {
                image: image.id(),
                depth: depth.id(),
                depth_size: (depth.width(), depth.height()),
                target: resized.canvas,
                opts: opts.refine,
            },
            compute,
        ),
        None => compute().map(Arc::new),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
