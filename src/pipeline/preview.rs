use crate::{
    assets::decode::SourceImage,
    depth::normalize::DepthField,
    foundation::{core::Canvas, error::BehindTextResult},
    render::{
        compositor::{Compositor, LayerInputs, RenderMode, preview_canvas},
        frame::FrameRGBA,
    },
    text::params::TextOverlayParams,
};

/// One interactive frame: the image fitted to a container at a given pixel density.
#[derive(Clone, Copy, Debug)]
pub struct PreviewRequest<'a> {
    pub image: &'a SourceImage,
    pub params: &'a TextOverlayParams,
    pub depth: Option<&'a DepthField>,
    pub cutout: Option<&'a image::RgbaImage>,
    /// Container size in CSS pixels.
    pub container_width: f64,
    pub container_height: f64,
    pub device_pixel_ratio: f64,
}

/// Draw a preview into a caller-owned surface and return the size it was drawn at.
///
/// The surface is reshaped to the preview size; its allocation is kept across calls.
pub fn render_preview(
    compositor: &mut Compositor,
    req: &PreviewRequest<'_>,
    surface: &mut FrameRGBA,
) -> BehindTextResult<Canvas> {
    req.params.validate()?;
    let target = preview_canvas(
        req.image.canvas(),
        req.container_width,
        req.container_height,
        req.device_pixel_ratio,
        compositor.opts().max_device_pixel_ratio,
    )?;
    let inputs = LayerInputs {
        image: req.image,
        params: req.params,
        depth: req.depth,
        cutout: req.cutout,
    };
    compositor.compose_into(&inputs, target, RenderMode::Preview, surface)?;
    Ok(target)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/preview.rs"]
mod tests;
