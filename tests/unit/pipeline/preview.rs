use super::*;
use crate::{render::compositor::CompositorOpts, text::raster::TextRasterizer};

fn compositor() -> Compositor {
    Compositor::new(
        CompositorOpts::default(),
        TextRasterizer::with_fontdb(usvg::fontdb::Database::new()),
    )
}

fn image(w: u32, h: u32) -> SourceImage {
    SourceImage::from_rgba8(w, h, [10, 20, 30, 255].repeat((w * h) as usize)).unwrap()
}

#[test]
fn preview_sizes_surface_from_container_and_dpr() {
    let img = image(400, 200);
    let params = TextOverlayParams::default();
    let mut surface = FrameRGBA::default();
    let mut c = compositor();

    let req = PreviewRequest {
        image: &img,
        params: &params,
        depth: None,
        cutout: None,
        container_width: 100.0,
        container_height: 100.0,
        device_pixel_ratio: 2.0,
    };
    let size = render_preview(&mut c, &req, &mut surface).unwrap();
    assert_eq!((size.width, size.height), (200, 100));
    assert_eq!((surface.width, surface.height), (200, 100));
    assert_eq!(surface.data.len(), 200 * 100 * 4);

    let req = PreviewRequest {
        container_width: 1000.0,
        container_height: 1000.0,
        device_pixel_ratio: 1.0,
        ..req
    };
    let size = render_preview(&mut c, &req, &mut surface).unwrap();
    assert_eq!((size.width, size.height), (400, 200));
}

#[test]
fn preview_rejects_invalid_params() {
    let img = image(8, 8);
    let mut params = TextOverlayParams::default();
    params.depth_threshold = 300.0;
    let req = PreviewRequest {
        image: &img,
        params: &params,
        depth: None,
        cutout: None,
        container_width: 8.0,
        container_height: 8.0,
        device_pixel_ratio: 1.0,
    };
    let err = render_preview(&mut compositor(), &req, &mut FrameRGBA::default()).unwrap_err();
    assert!(matches!(
        err,
        crate::foundation::error::BehindTextError::Validation(_)
    ));
}
