use super::*;

fn encode(img: image::DynamicImage, format: image::ImageFormat) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

#[test]
fn decodes_png_with_alpha() {
    let mut rgba = image::RgbaImage::new(3, 2);
    rgba.put_pixel(1, 1, image::Rgba([10, 20, 30, 128]));
    let bytes = encode(
        image::DynamicImage::ImageRgba8(rgba),
        image::ImageFormat::Png,
    );

    let src = decode_image(&bytes).unwrap();
    assert_eq!((src.width(), src.height()), (3, 2));
    assert_eq!(src.channels(), 4);
    assert_eq!(src.rgba().get_pixel(1, 1).0, [10, 20, 30, 128]);
}

#[test]
fn decodes_rgb_jpeg_as_opaque() {
    let rgb = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 100, 50]));
    let bytes = encode(
        image::DynamicImage::ImageRgb8(rgb),
        image::ImageFormat::Jpeg,
    );

    let src = decode_image(&bytes).unwrap();
    assert_eq!(src.channels(), 3);
    assert!(src.rgba().pixels().all(|p| p.0[3] == 255));
}

#[test]
fn rejects_unsupported_formats() {
    let rgb = image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]));
    let bmp = encode(image::DynamicImage::ImageRgb8(rgb), image::ImageFormat::Bmp);
    let err = decode_image(&bmp).unwrap_err();
    assert!(matches!(err, BehindTextError::Acquisition(_)));

    assert!(decode_image(b"not an image").is_err());
}

#[test]
fn image_id_tracks_content() {
    let a = SourceImage::from_rgba8(2, 1, vec![0, 0, 0, 255, 9, 9, 9, 255]).unwrap();
    let b = SourceImage::from_rgba8(2, 1, vec![0, 0, 0, 255, 9, 9, 9, 255]).unwrap();
    let c = SourceImage::from_rgba8(2, 1, vec![0, 0, 0, 255, 9, 9, 8, 255]).unwrap();
    let d = SourceImage::from_rgba8(1, 2, vec![0, 0, 0, 255, 9, 9, 9, 255]).unwrap();
    assert_eq!(a.id(), b.id());
    assert_ne!(a.id(), c.id());
    assert_ne!(a.id(), d.id());
}

#[test]
fn from_rgba8_rejects_bad_length() {
    assert!(SourceImage::from_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(SourceImage::from_rgba8(0, 2, vec![]).is_err());
}

#[test]
fn resize_keeps_native_pixels_and_premultiplies() {
    let src = SourceImage::from_rgba8(2, 1, vec![255, 0, 0, 255, 200, 100, 50, 0]).unwrap();
    let r = src.resize_to(src.canvas());
    assert_eq!(r.straight, vec![255, 0, 0, 255, 200, 100, 50, 0]);
    assert_eq!(r.premul, vec![255, 0, 0, 255, 0, 0, 0, 0]);

    let down = src.resize_to(Canvas::new(1, 1).unwrap());
    assert_eq!(down.straight.len(), 4);
}

#[test]
fn luma_guide_uses_rec601_weights() {
    let src = SourceImage::from_rgba8(3, 1, vec![255, 255, 255, 255, 0, 0, 0, 255, 255, 0, 0, 255])
        .unwrap();
    let g = src.resize_to(src.canvas()).luma_guide();
    assert!((g.at(0, 0) - 1.0).abs() < 1e-5);
    assert_eq!(g.at(1, 0), 0.0);
    assert!((g.at(2, 0) - 0.299).abs() < 1e-5);
}

#[test]
fn premultiply_round_trip_is_close() {
    let mut px = vec![200, 100, 50, 128];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![100, 50, 25, 128]);
    unpremultiply_rgba8_in_place(&mut px);
    assert!((i32::from(px[0]) - 200).abs() <= 1);
    assert!((i32::from(px[1]) - 100).abs() <= 1);
    assert!((i32::from(px[2]) - 50).abs() <= 1);
}
