use std::borrow::Cow;

use image::{Rgba, RgbaImage, imageops};

/// Relative ratio difference under which fitting is skipped.
pub const RATIO_TOLERANCE: f64 = 0.02;

/// Policy reconciling the poster's aspect ratio with a destination zone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// Center-crop the longer axis (never grows).
    #[default]
    #[serde(alias = "crop")]
    Fill,
    /// Pad the narrower axis with a uniform background (never shrinks).
    #[serde(alias = "letterbox")]
    Fit,
    /// Leave the poster as-is and let the warp distort it.
    Stretch,
}

impl std::str::FromStr for FillMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fill" | "crop" => Ok(Self::Fill),
            "fit" | "letterbox" => Ok(Self::Fit),
            "stretch" => Ok(Self::Stretch),
            other => Err(format!("unknown fill mode '{other}'")),
        }
    }
}

fn ratio_of(img: &RgbaImage) -> f64 {
    f64::from(img.width()) / f64::from(img.height().max(1))
}

fn within_tolerance(ratio: f64, target: f64) -> bool {
    !target.is_finite() || target <= 0.0 || ((ratio - target).abs() / target) < RATIO_TOLERANCE
}

/// Pad `img` with `background` to reach `target_ratio`, centered.
pub fn letterbox(img: &RgbaImage, target_ratio: f64, background: Rgba<u8>) -> Cow<'_, RgbaImage> {
    let ratio = ratio_of(img);
    if within_tolerance(ratio, target_ratio) {
        return Cow::Borrowed(img);
    }

    let (w, h) = img.dimensions();
    let (out_w, out_h) = if ratio > target_ratio {
        let grown = (f64::from(w) / target_ratio).round() as u32;
        (w, grown.max(h))
    } else {
        let grown = (f64::from(h) * target_ratio).round() as u32;
        (grown.max(w), h)
    };

    let mut canvas = RgbaImage::from_pixel(out_w, out_h, background);
    let x = i64::from((out_w - w) / 2);
    let y = i64::from((out_h - h) / 2);
    imageops::replace(&mut canvas, img, x, y);
    Cow::Owned(canvas)
}

/// Center-crop `img` to reach `target_ratio`.
pub fn crop_to_fill(img: &RgbaImage, target_ratio: f64) -> Cow<'_, RgbaImage> {
    let ratio = ratio_of(img);
    if within_tolerance(ratio, target_ratio) {
        return Cow::Borrowed(img);
    }

    let (w, h) = img.dimensions();
    let (out_w, out_h) = if ratio > target_ratio {
        let shrunk = (f64::from(h) * target_ratio).round() as u32;
        (shrunk.clamp(1, w), h)
    } else {
        let shrunk = (f64::from(w) / target_ratio).round() as u32;
        (w, shrunk.clamp(1, h))
    };

    let x = (w - out_w) / 2;
    let y = (h - out_h) / 2;
    Cow::Owned(imageops::crop_imm(img, x, y, out_w, out_h).to_image())
}

/// Apply `mode` against a target zone ratio.
pub fn apply_fill(
    img: &RgbaImage,
    mode: FillMode,
    target_ratio: Option<f64>,
    background: Rgba<u8>,
) -> Cow<'_, RgbaImage> {
    let Some(target) = target_ratio else {
        return Cow::Borrowed(img);
    };
    match mode {
        FillMode::Fill => crop_to_fill(img, target),
        FillMode::Fit => letterbox(img, target, background),
        FillMode::Stretch => Cow::Borrowed(img),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/fit.rs"]
mod tests;
