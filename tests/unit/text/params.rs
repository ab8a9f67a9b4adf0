use super::*;
use serde_json::json;

#[test]
fn defaults_match_product_defaults() {
    let p = TextOverlayParams::default();
    assert_eq!(p.text, "YOUR TEXT");
    assert_eq!(p.font_family, "Anton");
    assert_eq!(p.font_size, 120.0);
    assert_eq!(p.depth_threshold, 128.0);
    assert_eq!(p.gradient_end_color.to_string(), "#00a8ff");
    assert!(p.shadow().is_none());
    assert!(p.stroke().is_none());
    p.validate().unwrap();
}

#[test]
fn json_uses_camel_case_and_fills_missing_fields() {
    let p: TextOverlayParams = serde_json::from_value(json!({
        "text": "HELLO",
        "fontSize": 90,
        "shadowEnabled": true,
        "color": "#ff0000"
    }))
    .unwrap();
    assert_eq!(p.text, "HELLO");
    assert_eq!(p.font_size, 90.0);
    assert_eq!(p.font_family, "Anton");
    assert_eq!(p.color, Color::rgba(1.0, 0.0, 0.0, 1.0));
    let shadow = p.shadow().unwrap();
    assert_eq!((shadow.blur, shadow.offset_y), (10.0, 4.0));

    let v = serde_json::to_value(&p).unwrap();
    assert_eq!(v["positionX"], json!(50.0));
    assert_eq!(v["strokeColor"], json!("#000000"));
}

#[test]
fn env_overrides_apply_and_bad_values_are_ignored() {
    let p = TextOverlayParams::with_default_overrides(|k| match k {
        ENV_DEFAULT_TEXT => Some("BIG".to_owned()),
        ENV_DEFAULT_FONT_SIZE => Some("200".to_owned()),
        ENV_DEFAULT_FONT_COLOR => Some("#123".to_owned()),
        _ => None,
    });
    assert_eq!(p.text, "BIG");
    assert_eq!(p.font_size, 200.0);
    assert_eq!(p.color.to_string(), "#112233");

    let p = TextOverlayParams::with_default_overrides(|k| match k {
        ENV_DEFAULT_FONT_SIZE => Some("huge".to_owned()),
        ENV_DEFAULT_FONT_COLOR => Some("blurple".to_owned()),
        _ => None,
    });
    assert_eq!(p, TextOverlayParams::default());
}

#[test]
fn validate_rejects_out_of_range_values() {
    let cases: Vec<Box<dyn Fn(&mut TextOverlayParams)>> = vec![
        Box::new(|p| p.depth_threshold = 256.0),
        Box::new(|p| p.depth_threshold = -1.0),
        Box::new(|p| p.position_x = 101.0),
        Box::new(|p| p.position_y = f32::NAN),
        Box::new(|p| p.opacity = 1.5),
        Box::new(|p| p.font_size = 0.0),
        Box::new(|p| p.font_weight = 0),
        Box::new(|p| p.skew_x = 90.0),
        Box::new(|p| p.stroke_width = -2.0),
        Box::new(|p| p.shadow_blur = f32::INFINITY),
        Box::new(|p| p.font_family = " ".to_owned()),
    ];
    for (i, mutate) in cases.iter().enumerate() {
        let mut p = TextOverlayParams::default();
        mutate(&mut p);
        let err = p.validate().unwrap_err();
        assert!(matches!(err, BehindTextError::Validation(_)), "case {i}");
    }
}

#[test]
fn patch_applies_only_present_fields() {
    let patch: TextOverlayPatch =
        serde_json::from_value(json!({"opacity": 0.5, "strokeEnabled": true})).unwrap();
    let mut p = TextOverlayParams::default();
    patch.apply(&mut p);
    assert_eq!(p.opacity, 0.5);
    assert!(p.stroke().is_some());
    assert_eq!(p.text, "YOUR TEXT");
    assert_eq!(patch.depth_threshold, None);

    assert!(serde_json::from_value::<TextOverlayPatch>(json!({"bogus": 1})).is_err());
}

#[test]
fn parse_assignment_reads_typed_values() {
    let mut p = TextOverlayParams::default();
    for s in [
        "fontSize=90",
        "text=HELLO WORLD",
        "useGradient=true",
        "color=#00ff00",
        "text=42",
    ] {
        TextOverlayPatch::parse_assignment(s).unwrap().apply(&mut p);
    }
    assert_eq!(p.font_size, 90.0);
    assert_eq!(p.text, "42");
    assert!(p.use_gradient);
    assert_eq!(p.color.to_string(), "#00ff00");

    let threshold = TextOverlayPatch::parse_assignment("depthThreshold=200").unwrap();
    assert_eq!(threshold.depth_threshold, Some(200.0));
    assert!(TextOverlayPatch::parse_assignment("noequals").is_err());
    assert!(TextOverlayPatch::parse_assignment("nope=1").is_err());
    assert!(TextOverlayPatch::parse_assignment("fontSize=big").is_err());
}

#[test]
fn merge_prefers_later_patch() {
    let a = TextOverlayPatch {
        text: Some("A".to_owned()),
        opacity: Some(0.2),
        ..Default::default()
    };
    let b = TextOverlayPatch {
        text: Some("B".to_owned()),
        ..Default::default()
    };
    let merged = a.merge(&b);
    assert_eq!(merged.text.as_deref(), Some("B"));
    assert_eq!(merged.opacity, Some(0.2));
}
