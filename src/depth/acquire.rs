use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::Context;

use crate::{
    assets::decode::SourceImage,
    depth::normalize::{DepthField, RawDepth, normalize_depth},
    foundation::error::{BehindTextError, BehindTextResult},
};

/// A depth model behind a narrow contract: one image in, one raw depth grid out.
///
/// Implementations own their model handle. `prepare` is called lazily before the first
/// estimate and may be slow (download, compile); `estimate` may be called many times after.
pub trait DepthEstimator: Send {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Whether the model handle is already loaded.
    fn is_prepared(&self) -> bool {
        true
    }

    /// Load the model. `on_progress` receives a completion fraction in `[0, 1]`.
    fn prepare(&mut self, _on_progress: &mut dyn FnMut(f32)) -> BehindTextResult<()> {
        Ok(())
    }

    /// Run inference. A capability problem with the compute backend must surface as
    /// [`BehindTextError::Unsupported`] so the caller can fall back.
    fn estimate(&mut self, image: &SourceImage) -> BehindTextResult<RawDepth>;
}

/// Cooperative cancellation flag shared between the caller and an acquisition.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquisitionStage {
    LoadingModel,
    DownloadingModel,
    Estimating,
    RetryingOnFallback,
    Done,
}

impl AcquisitionStage {
    /// User-facing status line.
    pub fn status(self) -> &'static str {
        match self {
            Self::LoadingModel => "Loading depth model...",
            Self::DownloadingModel => "Downloading depth model...",
            Self::Estimating => "Estimating depth...",
            Self::RetryingOnFallback => "Retrying with CPU...",
            Self::Done => "Done!",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquisitionProgress {
    pub stage: AcquisitionStage,
    /// Overall completion, 0..=100.
    pub percent: u8,
}

/// Drives a [`DepthEstimator`] to a normalized [`DepthField`], reporting progress and honoring
/// cancellation between coarse steps.
///
/// An optional fallback estimator is tried once when the primary reports
/// [`BehindTextError::Unsupported`]; after that the fallback stays active.
pub struct DepthAcquisition {
    primary: Box<dyn DepthEstimator>,
    fallback: Option<Box<dyn DepthEstimator>>,
    using_fallback: bool,
}

impl DepthAcquisition {
    pub fn new(estimator: Box<dyn DepthEstimator>) -> Self {
        Self {
            primary: estimator,
            fallback: None,
            using_fallback: false,
        }
    }

    pub fn with_fallback(mut self, fallback: Box<dyn DepthEstimator>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Name of the estimator currently in use.
    pub fn active_name(&self) -> &str {
        self.active().name()
    }

    fn active(&self) -> &dyn DepthEstimator {
        match (&self.fallback, self.using_fallback) {
            (Some(f), true) => f.as_ref(),
            _ => self.primary.as_ref(),
        }
    }

    fn active_mut(&mut self) -> &mut dyn DepthEstimator {
        match (&mut self.fallback, self.using_fallback) {
            (Some(f), true) => f.as_mut(),
            _ => self.primary.as_mut(),
        }
    }

    /// Acquire and normalize depth for `image`.
    ///
    /// Returns `Ok(None)` when `cancel` was set at any resumption point; partial results are
    /// dropped without being reported.
    #[tracing::instrument(skip_all, fields(estimator = %self.active_name()))]
    pub fn acquire(
        &mut self,
        image: &SourceImage,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(AcquisitionProgress),
    ) -> BehindTextResult<Option<DepthField>> {
        on_progress(AcquisitionProgress {
            stage: AcquisitionStage::LoadingModel,
            percent: 0,
        });

        match self.run_active(image, cancel, &mut on_progress) {
            Err(BehindTextError::Unsupported(msg)) if self.can_fall_back() => {
                tracing::warn!(reason = %msg, "depth backend unsupported, switching to fallback");
                self.using_fallback = true;
                on_progress(AcquisitionProgress {
                    stage: AcquisitionStage::RetryingOnFallback,
                    percent: 0,
                });
                self.run_active(image, cancel, &mut on_progress)
            }
            other => other,
        }
    }

    fn can_fall_back(&self) -> bool {
        self.fallback.is_some() && !self.using_fallback
    }

    fn run_active(
        &mut self,
        image: &SourceImage,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(AcquisitionProgress),
    ) -> BehindTextResult<Option<DepthField>> {
        let estimator = self.active_mut();

        if !estimator.is_prepared() {
            on_progress(AcquisitionProgress {
                stage: AcquisitionStage::DownloadingModel,
                percent: 0,
            });
            estimator.prepare(&mut |fraction| {
                on_progress(AcquisitionProgress {
                    stage: AcquisitionStage::DownloadingModel,
                    percent: (fraction.clamp(0.0, 1.0) * 50.0).round() as u8,
                });
            })?;
        }
        if cancel.is_cancelled() {
            tracing::debug!("cancelled after model load");
            return Ok(None);
        }

        on_progress(AcquisitionProgress {
            stage: AcquisitionStage::Estimating,
            percent: 60,
        });
        if cancel.is_cancelled() {
            tracing::debug!("cancelled after image load");
            return Ok(None);
        }

        let raw = estimator.estimate(image)?;
        on_progress(AcquisitionProgress {
            stage: AcquisitionStage::Estimating,
            percent: 90,
        });
        if cancel.is_cancelled() {
            tracing::debug!("cancelled after inference");
            return Ok(None);
        }

        let depth = normalize_depth(&raw);
        tracing::debug!(
            width = depth.width(),
            height = depth.height(),
            "depth acquired"
        );
        on_progress(AcquisitionProgress {
            stage: AcquisitionStage::Done,
            percent: 100,
        });
        Ok(Some(depth))
    }
}

/// Serves a precomputed depth map stored as a grayscale image (8 or 16 bit).
///
/// Brighter pixels are closer, matching the convention of relative-depth networks.
pub struct DepthMapFileEstimator {
    path: PathBuf,
    loaded: Option<RawDepth>,
}

impl DepthMapFileEstimator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: None,
        }
    }
}

impl DepthEstimator for DepthMapFileEstimator {
    fn name(&self) -> &str {
        "depth-map-file"
    }

    fn is_prepared(&self) -> bool {
        self.loaded.is_some()
    }

    fn prepare(&mut self, on_progress: &mut dyn FnMut(f32)) -> BehindTextResult<()> {
        self.loaded = Some(load_depth_map(&self.path)?);
        on_progress(1.0);
        Ok(())
    }

    fn estimate(&mut self, _image: &SourceImage) -> BehindTextResult<RawDepth> {
        match &self.loaded {
            Some(raw) => Ok(raw.clone()),
            None => load_depth_map(&self.path),
        }
    }
}

/// Decode a grayscale depth image into raw samples on a 0..=65535 scale.
pub fn load_depth_map(path: &Path) -> BehindTextResult<RawDepth> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read depth map '{}'", path.display()))?;
    decode_depth_map(&bytes)
}

/// Decode grayscale depth image bytes (any format the image crate reads).
pub fn decode_depth_map(bytes: &[u8]) -> BehindTextResult<RawDepth> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| BehindTextError::acquisition(format!("could not decode depth map: {e}")))?;
    let luma = img.to_luma16();
    let (w, h) = luma.dimensions();
    let samples = luma.into_raw().into_iter().map(f32::from).collect();
    RawDepth::new(samples, w as usize, h as usize)
}

#[cfg(test)]
#[path = "../../tests/unit/depth/acquire.rs"]
mod tests;
