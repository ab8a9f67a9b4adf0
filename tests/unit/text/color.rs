use super::*;
use serde_json::json;

#[test]
fn parses_hex_forms() {
    assert_eq!(
        Color::parse("#ff0000").unwrap(),
        Color::rgba(1.0, 0.0, 0.0, 1.0)
    );
    assert_eq!(Color::parse("#FFF").unwrap(), Color::WHITE);
    assert_eq!(
        Color::parse("#00a8ff").unwrap().to_rgba8(),
        [0, 168, 255, 255]
    );

    let c = Color::parse("#0000ff80").unwrap();
    assert!((c.b - 1.0).abs() < 1e-9);
    assert!((c.a - 128.0 / 255.0).abs() < 1e-9);

    assert_eq!(Color::parse("#0008").unwrap().to_rgba8(), [0, 0, 0, 136]);
}

#[test]
fn parses_functional_forms() {
    assert_eq!(
        Color::parse("rgba(0, 0, 0, 0.5)").unwrap().to_rgba8(),
        [0, 0, 0, 128]
    );
    assert_eq!(
        Color::parse("rgb(255 128 0)").unwrap().to_rgba8(),
        [255, 128, 0, 255]
    );
    assert_eq!(
        Color::parse("RGB(100%, 0%, 0%)").unwrap(),
        Color::rgba(1.0, 0.0, 0.0, 1.0)
    );

    let red = Color::parse("hsl(0, 100%, 50%)").unwrap();
    assert!((red.r - 1.0).abs() < 1e-9);
    assert!(red.g.abs() < 1e-9);
    let green = Color::parse("hsla(120deg 100% 25% / 50%)").unwrap();
    assert_eq!(green.to_rgba8(), [0, 128, 0, 128]);
}

#[test]
fn rejects_garbage() {
    for bad in [
        "",
        "#12",
        "#gggggg",
        "red",
        "rgb(1,2)",
        "rgb(a,b,c)",
        "hsl(1,2,3,4,5)",
    ] {
        assert!(Color::parse(bad).is_err(), "{bad}");
    }
}

#[test]
fn serializes_as_hex() {
    assert_eq!(
        serde_json::to_value(Color::WHITE).unwrap(),
        json!("#ffffff")
    );
    let c: Color = serde_json::from_value(json!("rgba(0,0,0,0.5)")).unwrap();
    assert_eq!(serde_json::to_value(c).unwrap(), json!("#00000080"));
    assert!(serde_json::from_value::<Color>(json!("nope")).is_err());
    assert_eq!(c.to_hex_rgb(), "#000000");
}
