use image::RgbaImage;

use crate::foundation::math::mul_div255_u8;

/// Straight (non-premultiplied) RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// How poster pixels combine with scene pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Poster replaces the scene (alpha-weighted).
    #[default]
    Normal,
    /// Poster darkens the scene, letting wall texture and shadows through.
    Multiply,
}

/// `src` over `dst`, weighted by the source alpha.
pub fn normal(dst: Rgba8, src: Rgba8) -> Rgba8 {
    mix(dst, [src[0], src[1], src[2]], src[3])
}

/// Multiply `src` into `dst`, weighted by the source alpha.
pub fn multiply(dst: Rgba8, src: Rgba8) -> Rgba8 {
    let product = [
        mul_div255_u8(u16::from(dst[0]), u16::from(src[0])),
        mul_div255_u8(u16::from(dst[1]), u16::from(src[1])),
        mul_div255_u8(u16::from(dst[2]), u16::from(src[2])),
    ];
    mix(dst, product, src[3])
}

fn mix(dst: Rgba8, color: [u8; 3], alpha: u8) -> Rgba8 {
    if alpha == 0 {
        return dst;
    }
    let a = u16::from(alpha);
    let inv = 255 - a;
    let mut out = [0u8; 4];
    for i in 0..3 {
        out[i] = mul_div255_u8(u16::from(color[i]), a)
            .saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out[3] = alpha.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    out
}

/// Blend `layer` onto `dst` with its top-left corner at `(x, y)`, clipping to `dst`.
pub fn blend_onto(dst: &mut RgbaImage, layer: &RgbaImage, x: i64, y: i64, mode: BlendMode) {
    let op = match mode {
        BlendMode::Normal => normal,
        BlendMode::Multiply => multiply,
    };

    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    for (lx, ly, px) in layer.enumerate_pixels() {
        if px[3] == 0 {
            continue;
        }
        let tx = x + i64::from(lx);
        let ty = y + i64::from(ly);
        if tx < 0 || ty < 0 || tx >= dw || ty >= dh {
            continue;
        }
        let target = dst.get_pixel_mut(tx as u32, ty as u32);
        target.0 = op(target.0, px.0);
    }
}

/// Composite `img` over an opaque `background`, leaving every pixel fully opaque.
pub fn flatten(img: &mut RgbaImage, background: [u8; 3]) {
    for px in img.pixels_mut() {
        let bg = [background[0], background[1], background[2], 255];
        px.0 = normal(bg, px.0);
        px.0[3] = 255;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/blend.rs"]
mod tests;
