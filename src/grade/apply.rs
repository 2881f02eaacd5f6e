use image::RgbaImage;
use rayon::prelude::*;

use crate::{
    foundation::math::{clamp_u8, luma},
    grade::preset::ColorGrade,
};

const WARMTH_RED_GAIN: f32 = 0.25;
const WARMTH_BLUE_CUT: f32 = 0.35;

/// Apply `grade` to the color channels of `img` in place.
///
/// Stages run in a fixed order (brightness, saturation, contrast, warmth), each one
/// quantizing back to 8 bits before the next. Alpha is left untouched.
pub fn apply_grade(img: &mut RgbaImage, grade: &ColorGrade) {
    if grade.is_identity() {
        return;
    }

    if grade.brightness != 1.0 {
        let k = grade.brightness;
        map_rgb(img, |[r, g, b]| [r * k, g * k, b * k]);
    }

    if grade.saturation != 1.0 {
        let k = grade.saturation;
        map_rgb(img, |[r, g, b]| {
            let y = luma(r, g, b);
            [y + (r - y) * k, y + (g - y) * k, y + (b - y) * k]
        });
    }

    if grade.contrast != 1.0 {
        let k = grade.contrast;
        let mean = mean_luma(img);
        map_rgb(img, |[r, g, b]| {
            [
                mean + (r - mean) * k,
                mean + (g - mean) * k,
                mean + (b - mean) * k,
            ]
        });
    }

    if grade.warmth != 0.0 {
        let w = grade.warmth.clamp(-100.0, 100.0) / 100.0;
        let red = 1.0 + w * WARMTH_RED_GAIN;
        let blue = 1.0 - w * WARMTH_BLUE_CUT;
        map_rgb(img, |[r, g, b]| [r * red, g, b * blue]);
    }
}

fn map_rgb(img: &mut RgbaImage, f: impl Fn([f32; 3]) -> [f32; 3] + Sync) {
    img.as_mut().par_chunks_exact_mut(4).for_each(|px| {
        let out = f([f32::from(px[0]), f32::from(px[1]), f32::from(px[2])]);
        px[0] = clamp_u8(out[0]);
        px[1] = clamp_u8(out[1]);
        px[2] = clamp_u8(out[2]);
    });
}

fn mean_luma(img: &RgbaImage) -> f32 {
    let n = img.as_raw().len() / 4;
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = img
        .as_raw()
        .par_chunks_exact(4)
        .map(|px| {
            f64::from(
                luma(f32::from(px[0]), f32::from(px[1]), f32::from(px[2]))
                    .round()
                    .clamp(0.0, 255.0),
            )
        })
        .sum();
    (sum / n as f64) as f32
}

#[cfg(test)]
#[path = "../../tests/unit/grade/apply.rs"]
mod tests;
