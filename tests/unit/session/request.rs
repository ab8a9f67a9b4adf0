use super::*;
use crate::{render::compositor::CompositorOpts, text::raster::TextRasterizer};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "behind_text_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn compositor() -> Compositor {
    Compositor::new(
        CompositorOpts::default(),
        TextRasterizer::with_fontdb(usvg::fontdb::Database::new()),
    )
}

#[test]
fn request_json_uses_camel_case_and_nested_params() {
    let req: GenerateRequest = serde_json::from_value(serde_json::json!({
        "image": "photo.jpg",
        "depth": "photo-depth.png",
        "params": { "text": "SUMMER", "depthThreshold": 90 },
        "withWatermark": true
    }))
    .unwrap();
    assert_eq!(req.image, PathBuf::from("photo.jpg"));
    assert!(req.with_watermark);

    let params = req.resolve_params(&TextOverlayParams::default()).unwrap();
    assert_eq!(params.text, "SUMMER");
    assert_eq!(params.depth_threshold, 90.0);
    assert_eq!(params.font_size, TextOverlayParams::default().font_size);

    assert!(serde_json::from_value::<GenerateRequest>(serde_json::json!({
        "image": "a.png",
        "bogus": 1
    }))
    .is_err());
}

#[test]
fn validation_rejects_empty_image_and_bad_params() {
    let base = TextOverlayParams::default();
    assert!(GenerateRequest::default().validate(&base).is_err());

    let req = GenerateRequest {
        image: "a.png".into(),
        params: TextOverlayPatch {
            position_x: Some(140.0),
            ..TextOverlayPatch::default()
        },
        ..GenerateRequest::default()
    };
    assert!(matches!(
        req.validate(&base),
        Err(BehindTextError::Validation(_))
    ));
}

#[test]
fn output_names_follow_image_stem() {
    let req = GenerateRequest {
        image: "dir/beach.jpg".into(),
        ..GenerateRequest::default()
    };
    assert_eq!(req.output_name(3), PathBuf::from("beach-behind-text.png"));

    let named = GenerateRequest {
        out: Some("custom.png".into()),
        ..req
    };
    assert_eq!(named.output_name(3), PathBuf::from("custom.png"));
}

#[test]
fn manifest_accepts_object_or_array_and_rebases_paths() {
    let dir = temp_dir("manifest");
    std::fs::create_dir_all(&dir).unwrap();

    let single = dir.join("one.json");
    std::fs::write(&single, r#"{"image":"a.png"}"#).unwrap();
    let reqs = load_manifest(&single).unwrap();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].image, dir.join("a.png"));

    let many = dir.join("many.json");
    std::fs::write(
        &many,
        r#"[{"image":"/abs/a.png"},{"image":"b.png","depth":"b-d.png"}]"#,
    )
    .unwrap();
    let reqs = load_manifest(&many).unwrap();
    assert_eq!(reqs[0].image, PathBuf::from("/abs/a.png"));
    assert_eq!(reqs[1].depth, Some(dir.join("b-d.png")));

    let broken = dir.join("broken.json");
    std::fs::write(&broken, "{").unwrap();
    assert!(matches!(
        load_manifest(&broken),
        Err(BehindTextError::Serde(_))
    ));
}

#[test]
fn batch_reports_each_item_and_keeps_going() {
    let dir = temp_dir("batch");
    std::fs::create_dir_all(&dir).unwrap();
    let img_path = dir.join("scene.png");
    image::RgbaImage::from_pixel(20, 10, image::Rgba([30, 60, 90, 255]))
        .save(&img_path)
        .unwrap();
    let depth_path = dir.join("scene-depth.png");
    image::GrayImage::from_fn(20, 10, |x, _| image::Luma([(x * 12) as u8]))
        .save(&depth_path)
        .unwrap();

    let requests = vec![
        GenerateRequest {
            image: img_path.clone(),
            depth: Some(depth_path),
            with_watermark: true,
            ..GenerateRequest::default()
        },
        GenerateRequest {
            image: dir.join("missing.png"),
            ..GenerateRequest::default()
        },
    ];
    let out_dir = dir.join("out");
    let reports = run_batch(
        &mut compositor(),
        &TextOverlayParams::default(),
        &requests,
        &out_dir,
        None,
    )
    .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(
        reports[0].status,
        BatchStatus::Ok {
            width: 20,
            height: 10,
        }
    );
    let written = reports[0].output.as_ref().unwrap();
    assert!(written.exists());
    assert!(!reports[1].is_ok());

    let json = serde_json::to_value(&reports[1]).unwrap();
    assert_eq!(json["status"], "failed");
    assert!(json["message"].is_string());
}
