use crate::{
    assets::decode::SourceImage,
    depth::normalize::DepthField,
    foundation::error::BehindTextResult,
    render::{
        compositor::{Compositor, LayerInputs, RenderMode},
        frame::FrameRGBA,
    },
    text::params::TextOverlayParams,
};

/// Full-resolution render of one image.
#[derive(Clone, Copy, Debug)]
pub struct ExportRequest<'a> {
    pub image: &'a SourceImage,
    pub params: &'a TextOverlayParams,
    pub depth: Option<&'a DepthField>,
    pub cutout: Option<&'a image::RgbaImage>,
    /// Overlay the corner watermark.
    pub watermark: bool,
}

/// Composite at the image's native size. Preview scratch state is not touched.
#[tracing::instrument(
    skip_all,
    fields(w = req.image.width(), h = req.image.height(), watermark = req.watermark)
)]
pub fn export_frame(
    compositor: &mut Compositor,
    req: &ExportRequest<'_>,
) -> BehindTextResult<FrameRGBA> {
    req.params.validate()?;
    let inputs = LayerInputs {
        image: req.image,
        params: req.params,
        depth: req.depth,
        cutout: req.cutout,
    };
    compositor.compose(
        &inputs,
        req.image.canvas(),
        RenderMode::Export {
            watermark: req.watermark,
        },
    )
}

/// [`export_frame`] encoded as an 8-bit RGBA PNG.
pub fn export_composite(
    compositor: &mut Compositor,
    req: &ExportRequest<'_>,
) -> BehindTextResult<Vec<u8>> {
    export_frame(compositor, req)?.encode_png()
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/export.rs"]
mod tests;
