use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn smoothstep_endpoints_and_midpoint() {
    assert_eq!(smoothstep01(0.0), 0.0);
    assert_eq!(smoothstep01(1.0), 1.0);
    assert!((smoothstep01(0.5) - 0.5).abs() < 1e-6);
    assert_eq!(smoothstep01(-3.0), 0.0);
    assert_eq!(smoothstep01(7.0), 1.0);
}
