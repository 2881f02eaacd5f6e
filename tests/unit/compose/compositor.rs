use image::Rgba;

use super::*;
use crate::{compose::blend::BlendMode, fetch::StaticFetcher};

fn thirds_poster() -> RgbaImage {
    RgbaImage::from_fn(300, 300, |x, _| match x {
        0..100 => Rgba([255, 0, 0, 255]),
        100..200 => Rgba([0, 255, 0, 255]),
        _ => Rgba([0, 0, 255, 255]),
    })
}

fn geometry(corners: [[f64; 2]; 4], w: u32, h: u32, blend_mode: BlendMode) -> TemplateGeometry {
    TemplateGeometry {
        name: "t".to_string(),
        scene_ref: "scene.png".to_string(),
        scene_width: w,
        scene_height: h,
        corners: corners.map(|[x, y]| Point::new(x, y)),
        blend_mode,
    }
}

fn png_settings() -> ComposeSettings {
    ComposeSettings {
        output_format: OutputFormat::Png,
        ..ComposeSettings::default()
    }
}

fn dominant(px: Rgba<u8>) -> usize {
    let [r, g, b, _] = px.0;
    if r >= g && r >= b {
        0
    } else if g >= b {
        1
    } else {
        2
    }
}

#[test]
fn full_scene_zone_crops_square_poster_to_portrait() {
    let scene = RgbaImage::from_pixel(100, 150, Rgba([128, 128, 128, 255]));
    let geom = geometry(
        [[0.0, 0.0], [100.0, 0.0], [100.0, 150.0], [0.0, 150.0]],
        100,
        150,
        BlendMode::Normal,
    );

    let out = compose_rgba(&thirds_poster(), &scene, &geom, FillMode::Fill, &png_settings())
        .unwrap();
    assert_eq!(out.dimensions(), (100, 150));
    assert_eq!(dominant(*out.get_pixel(10, 75)), 0);
    // Cropping trims 50px off each side of the poster, so the red band is narrower.
    assert_eq!(dominant(*out.get_pixel(30, 75)), 1);
    assert_eq!(dominant(*out.get_pixel(50, 75)), 1);
    assert_eq!(dominant(*out.get_pixel(90, 75)), 2);

    let stretched = compose_rgba(
        &thirds_poster(),
        &scene,
        &geom,
        FillMode::Stretch,
        &png_settings(),
    )
    .unwrap();
    assert_eq!(dominant(*stretched.get_pixel(30, 75)), 0);
}

#[test]
fn output_matches_scene_size_when_virtual_size_differs() {
    let scene = RgbaImage::from_pixel(400, 200, Rgba([90, 90, 90, 255]));
    let geom = geometry(
        [[50.0, 20.0], [150.0, 30.0], [140.0, 80.0], [60.0, 90.0]],
        200,
        100,
        BlendMode::Normal,
    );
    let out = compose_rgba(&thirds_poster(), &scene, &geom, FillMode::Fit, &png_settings())
        .unwrap();
    assert_eq!(out.dimensions(), (400, 200));
    assert!(out.pixels().all(|p| p.0[3] == 255));
    // Outside the zone the scene is untouched.
    assert_eq!(*out.get_pixel(5, 5), Rgba([90, 90, 90, 255]));
}

#[test]
fn multiply_keeps_scene_shading_under_white_poster() {
    let scene = RgbaImage::from_pixel(100, 100, Rgba([200, 100, 50, 255]));
    let poster = RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]));
    let corners = [[25.0, 25.0], [75.0, 25.0], [75.0, 75.0], [25.0, 75.0]];

    let normal = compose_rgba(
        &poster,
        &scene,
        &geometry(corners, 100, 100, BlendMode::Normal),
        FillMode::Fill,
        &png_settings(),
    )
    .unwrap();
    assert_eq!(*normal.get_pixel(50, 50), Rgba([255, 255, 255, 255]));

    let multiplied = compose_rgba(
        &poster,
        &scene,
        &geometry(corners, 100, 100, BlendMode::Multiply),
        FillMode::Fill,
        &png_settings(),
    )
    .unwrap();
    assert_eq!(*multiplied.get_pixel(50, 50), Rgba([200, 100, 50, 255]));
}

#[test]
fn tiny_zone_is_skipped() {
    let scene = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
    let geom = geometry(
        [[10.0, 10.0], [15.0, 10.0], [15.0, 15.0], [10.0, 15.0]],
        100,
        100,
        BlendMode::Normal,
    );
    let err = compose_rgba(&thirds_poster(), &scene, &geom, FillMode::Fill, &png_settings())
        .unwrap_err();
    assert!(matches!(err, SkipReason::ZoneTooSmall { width: 5, height: 5 }));
}

#[test]
fn degenerate_zone_still_composes() {
    let scene = RgbaImage::from_pixel(120, 120, Rgba([10, 10, 10, 255]));
    let geom = geometry(
        [[0.0, 0.0], [50.0, 50.0], [100.0, 100.0], [0.0, 100.0]],
        120,
        120,
        BlendMode::Normal,
    );
    let out = compose_rgba(&thirds_poster(), &scene, &geom, FillMode::Fill, &png_settings())
        .unwrap();
    assert_eq!(out.dimensions(), (120, 120));
}

fn template(id: u64, scene_ref: &str, corners: [[f64; 2]; 4]) -> Template {
    let mut geometry = geometry(corners, 60, 60, BlendMode::Normal);
    geometry.scene_ref = scene_ref.to_string();
    Template {
        id: TemplateId(id),
        geometry,
        active: true,
        rank: id as u32,
    }
}

const ZONE: [[f64; 2]; 4] = [[10.0, 10.0], [50.0, 10.0], [50.0, 50.0], [10.0, 50.0]];
const TINY: [[f64; 2]; 4] = [[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]];

fn compositor() -> Compositor {
    let fetcher = StaticFetcher::new();
    let png = |img: &RgbaImage| raster::encode(img, OutputFormat::Png, 90).unwrap();
    fetcher.insert("poster.png", png(&thirds_poster()));
    fetcher.insert(
        "scene.png",
        png(&RgbaImage::from_pixel(60, 60, Rgba([120, 120, 120, 255]))),
    );
    Compositor::new(Arc::new(fetcher), png_settings())
}

#[tokio::test]
async fn ungraded_pass_yields_one_entry_per_template() {
    let c = compositor();
    let templates = vec![template(1, "scene.png", ZONE), template(2, "scene.png", ZONE)];
    let batch = c
        .compose_all("poster.png", &templates, FillMode::Fill, "none")
        .await
        .unwrap();
    assert_eq!(batch.entries.len(), 2);
    assert!(batch.skipped.is_empty());
    assert!(
        batch
            .entries
            .iter()
            .all(|e| e.variant == MockupVariant::Graded)
    );
    let decoded = raster::decode(&batch.entries[0].bytes).unwrap();
    assert_eq!(decoded.dimensions(), (60, 60));
}

#[tokio::test]
async fn graded_pass_appends_clean_entry_from_first_success() {
    let c = compositor();
    let templates = vec![
        template(1, "scene.png", TINY),
        template(2, "scene.png", ZONE),
        template(3, "scene.png", ZONE),
    ];
    let batch = c
        .compose_all("poster.png", &templates, FillMode::Fill, "moody")
        .await
        .unwrap();

    assert_eq!(batch.entries.len(), 3);
    let last = batch.entries.last().unwrap();
    assert_eq!(last.variant, MockupVariant::Clean);
    assert_eq!(last.template_id, TemplateId(2));
    assert_ne!(last.bytes, batch.entries[0].bytes);
    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(batch.skipped[0].template_id, TemplateId(1));
}

#[tokio::test]
async fn missing_scene_skips_only_that_template() {
    let c = compositor();
    let templates = vec![template(1, "gone.png", ZONE), template(2, "scene.png", ZONE)];
    let batch = c
        .compose_all("poster.png", &templates, FillMode::Fill, "none")
        .await
        .unwrap();
    assert_eq!(batch.entries.len(), 1);
    assert_eq!(batch.entries[0].template_id, TemplateId(2));
    assert!(matches!(
        batch.skipped[0].reason,
        SkipReason::SceneUnavailable { .. }
    ));
}

#[tokio::test]
async fn missing_poster_fails_the_whole_pass() {
    let c = compositor();
    let templates = vec![template(1, "scene.png", ZONE)];
    assert!(
        c.compose_all("nope.png", &templates, FillMode::Fill, "none")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn single_compose_applies_grade() {
    let c = compositor();
    let poster = c.load_poster("poster.png").await.unwrap();
    let t = template(1, "scene.png", ZONE);

    let plain = c
        .compose(Arc::clone(&poster), &t, FillMode::Fill, &ColorGrade::IDENTITY)
        .await
        .unwrap();
    let warm = c
        .compose(
            poster,
            &t,
            FillMode::Fill,
            &ColorGrade::preset("warm").unwrap(),
        )
        .await
        .unwrap();
    assert!(matches!(plain, ComposeOutcome::Composed(_)));
    assert_ne!(plain, warm);
}

#[tokio::test]
async fn forgotten_scene_is_fetched_again() {
    let fetcher = Arc::new(StaticFetcher::new());
    let png = |img: &RgbaImage| raster::encode(img, OutputFormat::Png, 90).unwrap();
    fetcher.insert("poster.png", png(&thirds_poster()));
    fetcher.insert(
        "scene.png",
        png(&RgbaImage::from_pixel(60, 60, Rgba([120, 120, 120, 255]))),
    );
    let c = Compositor::new(fetcher.clone(), png_settings());
    let templates = vec![template(1, "scene.png", ZONE)];
    let size = |batch: ComposeBatch| raster::decode(&batch.entries[0].bytes).unwrap().dimensions();

    let first = c
        .compose_all("poster.png", &templates, FillMode::Fill, "none")
        .await
        .unwrap();
    assert_eq!(size(first), (60, 60));

    fetcher.insert(
        "scene.png",
        png(&RgbaImage::from_pixel(90, 90, Rgba([120, 120, 120, 255]))),
    );
    let cached = c
        .compose_all("poster.png", &templates, FillMode::Fill, "none")
        .await
        .unwrap();
    assert_eq!(size(cached), (60, 60));

    c.forget_scene("scene.png");
    let fresh = c
        .compose_all("poster.png", &templates, FillMode::Fill, "none")
        .await
        .unwrap();
    assert_eq!(size(fresh), (90, 90));
}
