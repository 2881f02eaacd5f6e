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
fn clamp_u8_saturates_and_rounds() {
    assert_eq!(clamp_u8(-3.0), 0);
    assert_eq!(clamp_u8(300.0), 255);
    assert_eq!(clamp_u8(127.6), 128);
    assert_eq!(clamp_u8(f32::NAN), 0);
}

#[test]
fn luma_of_white_is_white() {
    assert!((luma(255.0, 255.0, 255.0) - 255.0).abs() < 1e-3);
}
