//! Projective (homography) solving and reverse-mapped raster warping.
//!
//! The solver follows the classic 8-coefficient formulation:
//!
//! ```text
//! u = (a·x + b·y + c) / (g·x + h·y + 1)
//! v = (d·x + e·y + f) / (g·x + h·y + 1)
//! ```
//!
//! where `(x, y)` is a destination pixel and `(u, v)` the source sample position, so the
//! resulting transform can be evaluated once per output pixel.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::{foundation::core::Point, geometry::zone::Corners};

const PIVOT_EPSILON: f64 = 1e-10;
const DET_EPSILON: f64 = 1e-12;

/// Reverse-mapping projective transform (destination space to source space).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projective {
    coeffs: [f64; 8],
}

impl Projective {
    /// Identity mapping.
    pub const IDENTITY: Self = Self {
        coeffs: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    };

    /// Raw coefficients `[a, b, c, d, e, f, g, h]`.
    pub fn coeffs(&self) -> [f64; 8] {
        self.coeffs
    }

    /// Map a destination-space point into source space.
    ///
    /// Returns `None` for points on the transform's line at infinity.
    #[inline]
    pub fn apply(&self, p: Point) -> Option<Point> {
        let [a, b, c, d, e, f, g, h] = self.coeffs;
        let w = g * p.x + h * p.y + 1.0;
        if w.abs() <= f64::EPSILON {
            return None;
        }
        Some(Point::new(
            (a * p.x + b * p.y + c) / w,
            (d * p.x + e * p.y + f) / w,
        ))
    }
}

/// Solve the projective transform mapping `dst` corners back onto `src` corners.
///
/// Returns `None` when the system is singular or the result is degenerate
/// (coincident or collinear corners). Callers are expected to fall back to an
/// unwarped placement in that case.
pub fn solve_perspective(src: &Corners, dst: &Corners) -> Option<Projective> {
    let mut m = [[0.0f64; 9]; 8];
    for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
        let (x, y, u, v) = (d.x, d.y, s.x, s.y);
        m[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, u];
        m[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, v];
    }

    let coeffs = gaussian_solve(m)?;
    if coeffs.iter().any(|c| !c.is_finite()) {
        return None;
    }

    let [a, b, c, d, e, f, g, h] = coeffs;
    let det = a * (e - f * h) - b * (d - f * g) + c * (d * h - e * g);
    if det.abs() <= DET_EPSILON {
        return None;
    }

    Some(Projective { coeffs })
}

fn gaussian_solve(mut m: [[f64; 9]; 8]) -> Option<[f64; 8]> {
    for col in 0..8 {
        let pivot_row = (col..8).max_by(|&r1, &r2| m[r1][col].abs().total_cmp(&m[r2][col].abs()))?;
        if m[pivot_row][col].abs() < PIVOT_EPSILON {
            return None;
        }
        m.swap(col, pivot_row);

        let pivot = m[col][col];
        for k in col..9 {
            m[col][k] /= pivot;
        }
        for row in 0..8 {
            if row == col {
                continue;
            }
            let factor = m[row][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..9 {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    let mut out = [0.0f64; 8];
    for (i, row) in m.iter().enumerate() {
        out[i] = row[8];
    }
    Some(out)
}

/// Warp `src` into a `width × height` raster by sampling through `transform`.
///
/// Output pixels whose pre-image falls outside `src` stay fully transparent, which
/// doubles as the blend mask for the destination quadrilateral.
pub fn warp(src: &RgbaImage, width: u32, height: u32, transform: &Projective) -> RgbaImage {
    let mut out = RgbaImage::new(width, height);
    if width == 0 || height == 0 || src.width() == 0 || src.height() == 0 {
        return out;
    }

    let sw = f64::from(src.width());
    let sh = f64::from(src.height());
    let row_len = width as usize * 4;

    out.as_mut()
        .par_chunks_exact_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width as usize {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let Some(p) = transform.apply(center) else {
                    continue;
                };
                if p.x < 0.0 || p.y < 0.0 || p.x >= sw || p.y >= sh {
                    continue;
                }
                let px = sample_bilinear(src, p.x - 0.5, p.y - 0.5);
                row[x * 4..x * 4 + 4].copy_from_slice(&px.0);
            }
        });

    out
}

fn sample_bilinear(src: &RgbaImage, fx: f64, fy: f64) -> Rgba<u8> {
    let max_x = i64::from(src.width()) - 1;
    let max_y = i64::from(src.height()) - 1;
    let x0 = fx.floor() as i64;
    let y0 = fy.floor() as i64;
    let tx = (fx - x0 as f64) as f32;
    let ty = (fy - y0 as f64) as f32;

    let at = |x: i64, y: i64| src.get_pixel(x.clamp(0, max_x) as u32, y.clamp(0, max_y) as u32).0;
    let p00 = at(x0, y0);
    let p10 = at(x0 + 1, y0);
    let p01 = at(x0, y0 + 1);
    let p11 = at(x0 + 1, y0 + 1);

    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = f32::from(p00[i]) * (1.0 - tx) + f32::from(p10[i]) * tx;
        let bottom = f32::from(p01[i]) * (1.0 - tx) + f32::from(p11[i]) * tx;
        out[i] = crate::foundation::math::clamp_u8(top * (1.0 - ty) + bottom * ty);
    }
    Rgba(out)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/perspective.rs"]
mod tests;
