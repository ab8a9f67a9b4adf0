use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    assets::decode::load_image_file,
    depth::acquire::load_depth_map,
    depth::normalize::normalize_depth,
    foundation::error::{BehindTextError, BehindTextResult},
    mask::cutout::{CutoutFileProvider, ForegroundCutout},
    pipeline::export::{ExportRequest, export_frame},
    render::{compositor::Compositor, frame::FrameRGBA},
    text::params::{TextOverlayParams, TextOverlayPatch},
};

/// One generation job: an image, where its depth or cutout comes from, and text overrides.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerateRequest {
    pub image: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutout: Option<PathBuf>,
    #[serde(default)]
    pub params: TextOverlayPatch,
    #[serde(default)]
    pub with_watermark: bool,
    /// Output file name; defaults to `<image stem>-behind-text.png`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<PathBuf>,
}

impl GenerateRequest {
    /// Parameters for this job: `base` with the request's overrides applied, validated.
    pub fn resolve_params(&self, base: &TextOverlayParams) -> BehindTextResult<TextOverlayParams> {
        let mut params = base.clone();
        self.params.apply(&mut params);
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self, base: &TextOverlayParams) -> BehindTextResult<()> {
        if self.image.as_os_str().is_empty() {
            return Err(BehindTextError::validation(
                "request is missing an image path",
            ));
        }
        self.resolve_params(base).map(|_| ())
    }

    /// Resolve relative paths against `dir`.
    pub fn rebase(mut self, dir: &Path) -> Self {
        let join = |p: PathBuf| if p.is_relative() { dir.join(p) } else { p };
        self.image = join(self.image);
        self.depth = self.depth.map(join);
        self.cutout = self.cutout.map(join);
        self
    }

    /// File name written for this request inside a batch output directory.
    pub fn output_name(&self, index: usize) -> PathBuf {
        if let Some(out) = &self.out {
            return out.clone();
        }
        let stem = self
            .image
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map_or_else(|| format!("image-{index}"), str::to_owned);
        PathBuf::from(format!("{stem}-behind-text.png"))
    }
}

/// Read a manifest holding one request or an array of them.
///
/// Relative paths inside are resolved against the manifest's directory.
pub fn load_manifest(path: &Path) -> BehindTextResult<Vec<GenerateRequest>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read manifest '{}'", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| BehindTextError::serde(format!("manifest: {e}")))?;
    let requests: Vec<GenerateRequest> = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value),
        _ => serde_json::from_value(value).map(|r| vec![r]),
    }
    .map_err(|e| BehindTextError::serde(format!("manifest: {e}")))?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(requests.into_iter().map(|r| r.rebase(dir)).collect())
}

/// Load inputs for `req` and render it at native resolution.
#[tracing::instrument(skip_all, fields(image = %req.image.display()))]
pub fn generate(
    compositor: &mut Compositor,
    base: &TextOverlayParams,
    req: &GenerateRequest,
    max_file_bytes: Option<u64>,
) -> BehindTextResult<FrameRGBA> {
    let params = req.resolve_params(base)?;
    let image = load_image_file(&req.image, max_file_bytes)?;
    let depth = match &req.depth {
        Some(p) => Some(normalize_depth(&load_depth_map(p)?)),
        None => None,
    };
    let cutout = match (&depth, &req.cutout) {
        (None, Some(p)) => Some(CutoutFileProvider::new(p).cutout(&image)?),
        _ => None,
    };
    export_frame(
        compositor,
        &ExportRequest {
            image: &image,
            params: &params,
            depth: depth.as_ref(),
            cutout: cutout.as_ref(),
            watermark: req.with_watermark,
        },
    )
}

/// Outcome of one batch item.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum BatchStatus {
    Ok { width: u32, height: u32 },
    Failed { message: String },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemReport {
    pub index: usize,
    pub image: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(flatten)]
    pub status: BatchStatus,
}

impl BatchItemReport {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, BatchStatus::Ok { .. })
    }
}

/// Process requests one at a time, writing one PNG each into `out_dir`.
///
/// A failing item is reported and the batch moves on.
pub fn run_batch(
    compositor: &mut Compositor,
    base: &TextOverlayParams,
    requests: &[GenerateRequest],
    out_dir: &Path,
    max_file_bytes: Option<u64>,
) -> BehindTextResult<Vec<BatchItemReport>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir '{}'", out_dir.display()))?;

    let mut reports = Vec::with_capacity(requests.len());
    for (index, req) in requests.iter().enumerate() {
        let output = out_dir.join(req.output_name(index));
        let res = req.validate(base).and_then(|()| {
            let frame = generate(compositor, base, req, max_file_bytes)?;
            frame.save_png(&output)?;
            Ok((frame.width, frame.height))
        });
        let report = match res {
            Ok((width, height)) => {
                tracing::info!(index, output = %output.display(), "batch item done");
                BatchItemReport {
                    index,
                    image: req.image.clone(),
                    output: Some(output),
                    status: BatchStatus::Ok { width, height },
                }
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "batch item failed");
                BatchItemReport {
                    index,
                    image: req.image.clone(),
                    output: None,
                    status: BatchStatus::Failed {
                        message: e.status(),
                    },
                }
            }
        };
        reports.push(report);
    }
    Ok(reports)
}

#[cfg(test)]
#[path = "../../tests/unit/session/request.rs"]
mod tests;
