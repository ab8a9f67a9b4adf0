use crate::{
    assets::decode::SourceImage,
    depth::{
        acquire::{AcquisitionProgress, CancelToken, DepthAcquisition},
        normalize::DepthField,
    },
    foundation::{
        core::Canvas,
        error::{BehindTextError, BehindTextResult},
    },
    mask::{cutout::ForegroundCutout, depth_mask::Mask},
    pipeline::{
        export::{ExportRequest, export_composite},
        preview::{PreviewRequest, render_preview},
    },
    render::{
        compositor::{Compositor, LayerInputs, fit_to_container},
        frame::FrameRGBA,
    },
    session::scheduler::{ContainerSize, PendingFrame},
    text::params::{TextOverlayParams, TextOverlayPatch},
};

/// State of one editing session: the loaded image, its depth and cutout, the current text
/// parameters and the compositor holding the preview scratch state.
///
/// Loading a new image or depth field invalidates the refinement cache and resets the
/// surface pool.
#[derive(Debug)]
pub struct EditorSession {
    compositor: Compositor,
    image: Option<SourceImage>,
    depth: Option<DepthField>,
    cutout: Option<image::RgbaImage>,
    params: TextOverlayParams,
    container: Option<ContainerSize>,
    status: Option<String>,
}

impl EditorSession {
    pub fn new(compositor: Compositor, params: TextOverlayParams) -> Self {
        Self {
            compositor,
            image: None,
            depth: None,
            cutout: None,
            params,
            container: None,
            status: None,
        }
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    pub fn depth(&self) -> Option<&DepthField> {
        self.depth.as_ref()
    }

    pub fn cutout(&self) -> Option<&image::RgbaImage> {
        self.cutout.as_ref()
    }

    pub fn params(&self) -> &TextOverlayParams {
        &self.params
    }

    pub fn container(&self) -> Option<ContainerSize> {
        self.container
    }

    /// Last user-facing status line (progress or failure).
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Replace the image. Depth and cutout belong to the old image and are dropped.
    pub fn load_image(&mut self, image: SourceImage) {
        tracing::debug!(w = image.width(), h = image.height(), "image loaded");
        self.image = Some(image);
        self.depth = None;
        self.cutout = None;
        self.status = None;
        self.compositor.invalidate();
    }

    pub fn set_depth(&mut self, depth: Option<DepthField>) {
        self.depth = depth;
        self.compositor.invalidate();
    }

    pub fn set_cutout(&mut self, cutout: Option<image::RgbaImage>) {
        self.cutout = cutout;
        self.compositor.invalidate();
    }

    /// Apply a parameter patch. The patch is rejected as a whole if the result is invalid.
    pub fn apply_patch(&mut self, patch: &TextOverlayPatch) -> BehindTextResult<()> {
        let mut next = self.params.clone();
        patch.apply(&mut next);
        next.validate()?;
        self.params = next;
        Ok(())
    }

    pub fn set_container(&mut self, container: ContainerSize) {
        self.container = Some(container);
    }

    /// Acquire depth for the loaded image and install it.
    ///
    /// Returns `Ok(false)` when `cancel` fired; the session keeps its previous depth in that
    /// case. Failures are recorded as the session status before being returned.
    pub fn acquire_depth(
        &mut self,
        acquisition: &mut DepthAcquisition,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(AcquisitionProgress),
    ) -> BehindTextResult<bool> {
        let image = self.image.as_ref().ok_or_else(no_image)?;
        let status = &mut self.status;
        let res = acquisition.acquire(image, cancel, |p| {
            *status = Some(p.stage.status().to_owned());
            on_progress(p);
        });
        match res {
            Ok(Some(depth)) => {
                self.set_depth(Some(depth));
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                self.status = Some(e.status());
                Err(e)
            }
        }
    }

    /// Run a background-removal provider on the loaded image and install its cutout.
    pub fn acquire_cutout(&mut self, provider: &mut dyn ForegroundCutout) -> BehindTextResult<()> {
        let cutout = provider.cutout(self.image.as_ref().ok_or_else(no_image)?)?;
        self.set_cutout(Some(cutout));
        Ok(())
    }

    /// Draw a preview for `container` into `surface`.
    pub fn render_preview(
        &mut self,
        container: ContainerSize,
        surface: &mut FrameRGBA,
    ) -> BehindTextResult<Canvas> {
        let image = self.image.as_ref().ok_or_else(no_image)?;
        self.container = Some(container);
        render_preview(
            &mut self.compositor,
            &PreviewRequest {
                image,
                params: &self.params,
                depth: self.depth.as_ref(),
                cutout: self.cutout.as_ref(),
                container_width: container.width,
                container_height: container.height,
                device_pixel_ratio: container.device_pixel_ratio,
            },
            surface,
        )
    }

    /// Apply a coalesced frame from the scheduler and redraw.
    ///
    /// The container size is kept even when the patch is rejected. Returns `Ok(None)` when no
    /// container size is known yet.
    pub fn run_frame(
        &mut self,
        frame: PendingFrame,
        surface: &mut FrameRGBA,
    ) -> BehindTextResult<Option<Canvas>> {
        if let Some(container) = frame.container {
            self.container = Some(container);
        }
        if let Some(patch) = &frame.patch {
            self.apply_patch(patch)?;
        }
        match self.container {
            Some(container) => self.render_preview(container, surface).map(Some),
            None => Ok(None),
        }
    }

    /// Full-resolution PNG of the current state.
    pub fn export_png(&mut self, watermark: bool) -> BehindTextResult<Vec<u8>> {
        let image = self.image.as_ref().ok_or_else(no_image)?;
        export_composite(
            &mut self.compositor,
            &ExportRequest {
                image,
                params: &self.params,
                depth: self.depth.as_ref(),
                cutout: self.cutout.as_ref(),
                watermark,
            },
        )
    }

    /// Foreground mask at the size the image would be shown in `container` (at 1x).
    pub fn mask(&mut self, container: Option<ContainerSize>) -> BehindTextResult<Option<Mask>> {
        let image = self.image.as_ref().ok_or_else(no_image)?;
        let target = match container {
            Some(c) => fit_to_container(image.canvas(), c.width, c.height)?,
            None => image.canvas(),
        };
        self.compositor.mask(
            &LayerInputs {
                image,
                params: &self.params,
                depth: self.depth.as_ref(),
                cutout: self.cutout.as_ref(),
            },
            target,
        )
    }
}

fn no_image() -> BehindTextError {
    BehindTextError::validation("no image loaded")
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
