use super::*;

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Corners {
    [
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ]
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
}

#[test]
fn identical_quads_solve_to_identity() {
    let q = rect(0.0, 0.0, 100.0, 50.0);
    let t = solve_perspective(&q, &q).unwrap();
    for (got, want) in t.coeffs().iter().zip(Projective::IDENTITY.coeffs()) {
        assert!((got - want).abs() < 1e-9);
    }
}

#[test]
fn reverse_mapping_sends_destination_corners_to_source_corners() {
    let src = rect(0.0, 0.0, 60.0, 90.0);
    let dst = [
        Point::new(12.0, 4.0),
        Point::new(70.0, 10.0),
        Point::new(66.0, 95.0),
        Point::new(3.0, 88.0),
    ];
    let t = solve_perspective(&src, &dst).unwrap();
    for (s, d) in src.iter().zip(dst.iter()) {
        assert!(close(t.apply(*d).unwrap(), *s));
    }
}

#[test]
fn coincident_corners_are_degenerate() {
    let src = rect(0.0, 0.0, 10.0, 10.0);
    let dst = [Point::new(5.0, 5.0); 4];
    assert!(solve_perspective(&src, &dst).is_none());
}

#[test]
fn collinear_corners_are_degenerate() {
    let src = rect(0.0, 0.0, 10.0, 10.0);
    let dst = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(2.0, 0.0),
        Point::new(3.0, 0.0),
    ];
    assert!(solve_perspective(&src, &dst).is_none());
}

#[test]
fn identity_warp_copies_pixels() {
    let mut src = RgbaImage::new(4, 3);
    for (i, px) in src.pixels_mut().enumerate() {
        *px = Rgba([i as u8 * 10, 0, 255 - i as u8, 255]);
    }
    let out = warp(&src, 4, 3, &Projective::IDENTITY);
    assert_eq!(out, src);
}

#[test]
fn warp_leaves_outside_of_quad_transparent() {
    let src = RgbaImage::from_pixel(10, 10, Rgba([0, 128, 255, 255]));
    let t = solve_perspective(&rect(0.0, 0.0, 10.0, 10.0), &rect(5.0, 5.0, 15.0, 15.0)).unwrap();
    let out = warp(&src, 20, 20, &t);
    assert_eq!(out.get_pixel(0, 0).0[3], 0);
    assert_eq!(out.get_pixel(19, 19).0[3], 0);
    assert_eq!(*out.get_pixel(10, 10), Rgba([0, 128, 255, 255]));
}
