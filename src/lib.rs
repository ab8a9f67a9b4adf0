//! Depth-guided "text behind subject" compositing.
//!
//! A photo, a relative depth map and a set of text parameters go in; a composite where the
//! text sits between the background and the foreground subject comes out. The depth map is
//! snapped to image edges with a two-scale guided filter, thresholded into a soft mask, and
//! used to redraw the subject over the text.
//!
//! The public API has two entry points over one algorithm:
//!
//! - [`render_preview`] draws a container-fitted frame into a caller-owned [`FrameRGBA`],
//!   reusing scratch surfaces and the refinement cache held by a [`Compositor`]
//! - [`export_composite`] renders at native resolution and returns PNG bytes
//!
//! [`EditorSession`] and [`FrameScheduler`] wrap these for interactive use; [`run_batch`]
//! processes [`GenerateRequest`] manifests.
#![forbid(unsafe_code)]

mod assets;
mod depth;
mod filter;
mod foundation;
mod mask;
mod pipeline;
mod refine;
mod render;
mod session;
mod text;

pub use crate::foundation::core::{Affine, Canvas, Field, Vec2};
pub use crate::foundation::error::{BehindTextError, BehindTextResult};

pub use crate::assets::decode::{ImageId, ResizedImage, SourceImage, decode_image, load_image_file};
pub use crate::depth::acquire::{
    AcquisitionProgress, AcquisitionStage, CancelToken, DepthAcquisition, DepthEstimator,
    DepthMapFileEstimator, decode_depth_map, load_depth_map,
};
pub use crate::depth::normalize::{DepthField, DepthId, RawDepth, normalize_depth};
pub use crate::filter::edges::{edge_strength, sobel_magnitude};
pub use crate::filter::guided::{GuidedFilterParams, fast_guided_filter};
pub use crate::filter::resample::{box_mean, box_sum, downsample, upsample_bilinear};
pub use crate::mask::cutout::{
    CUTOUT_DILATE_RADIUS, CutoutFileProvider, ForegroundCutout, MaskSource, cutout_mask,
    dilate_alpha,
};
pub use crate::mask::depth_mask::{Mask, MaskOpts, depth_mask, mask_alpha};
pub use crate::pipeline::export::{ExportRequest, export_composite, export_frame};
pub use crate::pipeline::preview::{PreviewRequest, render_preview};
pub use crate::refine::cache::{RefineCacheStats, RefineKey, RefinementCache};
pub use crate::refine::refiner::{RefineOpts, RefinedDepth, refine_depth};
pub use crate::render::composite::over_in_place;
pub use crate::render::compositor::{
    Compositor, CompositorOpts, LayerInputs, RenderMode, fit_to_container, preview_canvas,
};
pub use crate::render::frame::FrameRGBA;
pub use crate::render::surface_pool::{
    RenderSurfacePool, Surface, SurfacePoolOpts, SurfacePoolStats,
};
pub use crate::session::editor::EditorSession;
pub use crate::session::request::{
    BatchItemReport, BatchStatus, GenerateRequest, generate, load_manifest, run_batch,
};
pub use crate::session::scheduler::{ContainerSize, FrameScheduler, PendingFrame, SchedulerStats};
pub use crate::text::color::Color;
pub use crate::text::params::{
    ENV_DEFAULT_FONT_COLOR, ENV_DEFAULT_FONT_SIZE, ENV_DEFAULT_TEXT, ShadowParams, StrokeParams,
    TextOverlayParams, TextOverlayPatch,
};
pub use crate::text::raster::TextRasterizer;
pub use crate::text::svg::{
    REFERENCE_WIDTH, WATERMARK_TEXT, render_scale, text_layer_svg, text_transform,
    watermark_metrics, watermark_svg,
};
