use super::*;

#[test]
fn dilation_grows_a_point_into_a_disc() {
    let (w, h) = (11, 11);
    let mut src = vec![0u8; w * h];
    src[5 * w + 5] = 200;
    let out = dilate_alpha(&src, w, h, 4);

    assert_eq!(out[5 * w + 1], 200);
    assert_eq!(out[5 * w + 9], 200);
    assert_eq!(out[1 * w + 5], 200);
    // (3, 3) offset lies outside a radius-4 disc.
    assert_eq!(out[2 * w + 2], 0);
    assert_eq!(out[5 * w + 0], 0);
}

#[test]
fn dilation_handles_borders_and_zero_radius() {
    let src = vec![255, 0, 0, 0];
    assert_eq!(dilate_alpha(&src, 2, 2, 0), src);
    assert_eq!(dilate_alpha(&src, 2, 2, 1), vec![255, 255, 255, 0]);
}

#[test]
fn cutout_mask_resizes_and_never_shrinks_coverage() {
    let mut cut = image::RgbaImage::new(8, 8);
    for y in 2..6 {
        for x in 2..6 {
            cut.put_pixel(x, y, image::Rgba([10, 20, 30, 255]));
        }
    }
    let target = Canvas::new(32, 32).unwrap();
    let mask = cutout_mask(&cut, target, CUTOUT_DILATE_RADIUS).unwrap();
    assert_eq!(mask.canvas(), target);
    assert_eq!(mask.alpha()[16 * 32 + 16], 255);
    assert!(mask.alpha()[16 * 32 + 4] > 0);
    assert_eq!(mask.alpha()[0], 0);
}

#[test]
fn mask_source_defaults_to_depth() {
    assert_eq!(MaskSource::default(), MaskSource::Depth);
    let parsed: MaskSource = serde_json::from_str("\"cutout\"").unwrap();
    assert_eq!(parsed, MaskSource::Cutout);
}
