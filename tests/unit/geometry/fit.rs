use super::*;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn solid(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 255]))
}

#[test]
fn near_matching_ratio_is_a_noop() {
    let img = solid(100, 151);
    assert!(matches!(letterbox(&img, 100.0 / 150.0, WHITE), Cow::Borrowed(_)));
    assert!(matches!(crop_to_fill(&img, 100.0 / 150.0), Cow::Borrowed(_)));
}

#[test]
fn letterbox_pads_square_to_portrait_without_shrinking() {
    let img = solid(90, 90);
    let out = letterbox(&img, 2.0 / 3.0, WHITE);
    assert_eq!(out.dimensions(), (90, 135));
    // Padding band at the top, poster in the middle.
    assert_eq!(*out.get_pixel(45, 0), WHITE);
    assert_eq!(*out.get_pixel(45, 67), Rgba([200, 10, 10, 255]));
}

#[test]
fn letterbox_pads_tall_to_landscape() {
    let img = solid(40, 80);
    let out = letterbox(&img, 2.0, WHITE);
    assert_eq!(out.dimensions(), (160, 80));
    assert_eq!(*out.get_pixel(0, 40), WHITE);
}

#[test]
fn crop_to_fill_square_to_portrait_never_grows() {
    let img = solid(300, 300);
    let out = crop_to_fill(&img, 2.0 / 3.0);
    assert_eq!(out.dimensions(), (200, 300));
}

#[test]
fn crop_to_fill_wide_to_square() {
    let img = solid(400, 100);
    let out = crop_to_fill(&img, 1.0);
    assert_eq!(out.dimensions(), (100, 100));
}

#[test]
fn fit_modes_dispatch() {
    let img = solid(100, 100);
    let target = Some(0.5);
    assert_eq!(
        apply_fill(&img, FillMode::Fill, target, WHITE).dimensions(),
        (50, 100)
    );
    assert_eq!(
        apply_fill(&img, FillMode::Fit, target, WHITE).dimensions(),
        (100, 200)
    );
    assert_eq!(
        apply_fill(&img, FillMode::Stretch, target, WHITE).dimensions(),
        (100, 100)
    );
    assert_eq!(
        apply_fill(&img, FillMode::Fill, None, WHITE).dimensions(),
        (100, 100)
    );
}

#[test]
fn fill_mode_parses_aliases() {
    assert_eq!("crop".parse::<FillMode>().unwrap(), FillMode::Fill);
    assert_eq!("Letterbox".parse::<FillMode>().unwrap(), FillMode::Fit);
    let parsed: FillMode = serde_json::from_str("\"stretch\"").unwrap();
    assert_eq!(parsed, FillMode::Stretch);
}
