use super::*;
use crate::{
    depth::{acquire::DepthEstimator, normalize::RawDepth},
    render::compositor::CompositorOpts,
    session::scheduler::FrameScheduler,
    text::raster::TextRasterizer,
};

struct Ramp {
    fail: bool,
}

impl DepthEstimator for Ramp {
    fn name(&self) -> &str {
        "ramp"
    }

    fn estimate(&mut self, image: &SourceImage) -> BehindTextResult<RawDepth> {
        if self.fail {
            return Err(BehindTextError::acquisition("depth service unreachable"));
        }
        let (w, h) = (image.width() as usize, image.height() as usize);
        RawDepth::new((0..w * h).map(|i| (i % w) as f32).collect(), w, h)
    }
}

struct HalfCutout;

impl ForegroundCutout for HalfCutout {
    fn name(&self) -> &str {
        "half"
    }

    fn cutout(&mut self, image: &SourceImage) -> BehindTextResult<image::RgbaImage> {
        let w = image.width();
        Ok(image::RgbaImage::from_fn(w, image.height(), |x, _| {
            image::Rgba([0, 0, 0, if x >= w / 2 { 255 } else { 0 }])
        }))
    }
}

fn session() -> EditorSession {
    let compositor = Compositor::new(
        CompositorOpts::default(),
        TextRasterizer::with_fontdb(usvg::fontdb::Database::new()),
    );
    EditorSession::new(compositor, TextOverlayParams::default())
}

fn image(w: u32, h: u32) -> SourceImage {
    SourceImage::from_rgba8(w, h, [60, 120, 180, 255].repeat((w * h) as usize)).unwrap()
}

#[test]
fn rendering_without_image_is_a_validation_error() {
    let mut s = session();
    let err = s
        .render_preview(
            ContainerSize::new(10.0, 10.0, 1.0),
            &mut FrameRGBA::default(),
        )
        .unwrap_err();
    assert!(matches!(err, BehindTextError::Validation(_)));
    assert!(s.export_png(false).is_err());
}

#[test]
fn acquired_depth_is_installed_and_status_tracks_progress() {
    let mut s = session();
    s.load_image(image(8, 4));
    let mut acq = DepthAcquisition::new(Box::new(Ramp { fail: false }));
    let mut percents = Vec::new();
    let installed = s
        .acquire_depth(&mut acq, &CancelToken::new(), |p| percents.push(p.percent))
        .unwrap();
    assert!(installed);
    assert_eq!(percents.last(), Some(&100));
    assert_eq!(s.status(), Some("Done!"));
    let depth = s.depth().unwrap();
    assert_eq!((depth.width(), depth.height()), (8, 4));
}

#[test]
fn acquisition_failure_becomes_status() {
    let mut s = session();
    s.load_image(image(4, 4));
    let mut acq = DepthAcquisition::new(Box::new(Ramp { fail: true }));
    assert!(
        s.acquire_depth(&mut acq, &CancelToken::new(), |_| {})
            .is_err()
    );
    assert_eq!(s.status(), Some("depth service unreachable"));
    assert!(s.depth().is_none());
}

#[test]
fn cancelled_acquisition_keeps_previous_depth() {
    let mut s = session();
    s.load_image(image(4, 4));
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut acq = DepthAcquisition::new(Box::new(Ramp { fail: false }));
    assert!(!s.acquire_depth(&mut acq, &cancel, |_| {}).unwrap());
    assert!(s.depth().is_none());
}

#[test]
fn new_image_drops_depth_and_invalidates_cache() {
    let mut s = session();
    s.load_image(image(32, 16));
    let mut acq = DepthAcquisition::new(Box::new(Ramp { fail: false }));
    s.acquire_depth(&mut acq, &CancelToken::new(), |_| {})
        .unwrap();

    let container = ContainerSize::new(32.0, 16.0, 1.0);
    let mut surface = FrameRGBA::default();
    s.render_preview(container, &mut surface).unwrap();
    s.render_preview(container, &mut surface).unwrap();
    assert_eq!(s.compositor().refine_calls(), 1);

    s.load_image(image(16, 8));
    assert!(s.depth().is_none());
    assert!(s.compositor().cache_stats().invalidations >= 1);
    assert_eq!(s.compositor().pool_stats().retained_surfaces, 0);
}

#[test]
fn invalid_patch_leaves_params_untouched() {
    let mut s = session();
    let before = s.params().clone();
    let bad = TextOverlayPatch {
        text: Some("NEW".to_owned()),
        opacity: Some(2.0),
        ..TextOverlayPatch::default()
    };
    assert!(s.apply_patch(&bad).is_err());
    assert_eq!(s.params(), &before);

    let good = TextOverlayPatch {
        text: Some("NEW".to_owned()),
        ..TextOverlayPatch::default()
    };
    s.apply_patch(&good).unwrap();
    assert_eq!(s.params().text, "NEW");
}

#[test]
fn scheduled_frames_apply_patch_then_draw() {
    let mut s = session();
    s.load_image(image(40, 20));
    let mut sched = FrameScheduler::new();
    let mut surface = FrameRGBA::default();

    sched.request_params(TextOverlayPatch {
        opacity: Some(0.5),
        ..TextOverlayPatch::default()
    });
    let frame = sched.take_frame().unwrap();
    assert_eq!(s.run_frame(frame, &mut surface).unwrap(), None);
    assert_eq!(s.params().opacity, 0.5);

    sched.request_resize(ContainerSize::new(20.0, 20.0, 1.0));
    let frame = sched.take_frame().unwrap();
    let size = s.run_frame(frame, &mut surface).unwrap().unwrap();
    assert_eq!((size.width, size.height), (20, 10));
}

#[test]
fn rejected_patch_keeps_coalesced_resize() {
    let mut s = session();
    s.load_image(image(40, 20));
    let mut sched = FrameScheduler::new();
    let mut surface = FrameRGBA::default();

    sched.request_resize(ContainerSize::new(40.0, 20.0, 1.0));
    sched.request_params(TextOverlayPatch {
        opacity: Some(2.0),
        ..TextOverlayPatch::default()
    });
    let frame = sched.take_frame().unwrap();
    let err = s.run_frame(frame, &mut surface).unwrap_err();
    assert!(matches!(err, BehindTextError::Validation(_)));
    assert!(!sched.has_pending());
    assert_eq!(s.container(), Some(ContainerSize::new(40.0, 20.0, 1.0)));
    assert_eq!(s.params().opacity, TextOverlayParams::default().opacity);

    sched.request_redraw();
    let size = s
        .run_frame(sched.take_frame().unwrap(), &mut surface)
        .unwrap()
        .unwrap();
    assert_eq!((size.width, size.height), (40, 20));
}

#[test]
fn cutout_provides_mask_when_no_depth() {
    let mut s = session();
    s.load_image(image(16, 4));
    s.acquire_cutout(&mut HalfCutout).unwrap();
    let mask = s.mask(None).unwrap().unwrap();
    assert_eq!(mask.alpha()[15], 255);
    assert!(mask.alpha()[0] < 255);
}

#[test]
fn export_is_native_size() {
    let mut s = session();
    s.load_image(image(24, 12));
    let png = s.export_png(true).unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (24, 12));
}
