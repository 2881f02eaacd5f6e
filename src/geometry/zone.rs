use crate::foundation::core::{Point, Rect};

/// Destination quadrilateral in `TL, TR, BR, BL` order.
pub type Corners = [Point; 4];

/// Width/height ratio of a corner zone.
///
/// Averages the top and bottom edge lengths against the left and right ones, which
/// tolerates mild perspective skew. Returns `None` when the vertical edges collapse.
pub fn zone_ratio(corners: &Corners) -> Option<f64> {
    let [tl, tr, br, bl] = *corners;
    let horizontal = (tl.distance(tr) + bl.distance(br)) / 2.0;
    let vertical = (tl.distance(bl) + tr.distance(br)) / 2.0;
    if !vertical.is_finite() || vertical <= f64::EPSILON {
        return None;
    }
    let ratio = horizontal / vertical;
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}

/// Axis-aligned bounds of the four corners, snapped outwards to whole pixels.
pub fn pixel_bounds(corners: &Corners) -> Rect {
    let mut x0 = f64::INFINITY;
    let mut y0 = f64::INFINITY;
    let mut x1 = f64::NEG_INFINITY;
    let mut y1 = f64::NEG_INFINITY;
    for p in corners {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    Rect::new(x0.floor(), y0.floor(), x1.ceil(), y1.ceil())
}

/// Rescale corners authored against a virtual scene size onto the real raster size.
pub fn scale_corners(corners: &Corners, sx: f64, sy: f64) -> Corners {
    corners.map(|p| Point::new(p.x * sx, p.y * sy))
}

/// Shift corners so `origin` becomes `(0, 0)`.
pub fn localize(corners: &Corners, origin: Point) -> Corners {
    corners.map(|p| Point::new(p.x - origin.x, p.y - origin.y))
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/zone.rs"]
mod tests;
