use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage, codecs::jpeg::JpegEncoder};

use crate::foundation::error::{MockupError, MockupResult};

/// Encoded output format for composed mockups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Decode any raster the `image` crate understands into straight RGBA8.
pub fn decode(bytes: &[u8]) -> MockupResult<RgbaImage> {
    if bytes.is_empty() {
        return Err(MockupError::raster("empty image payload"));
    }
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}

/// Encode an opaque mockup raster.
pub fn encode(img: &RgbaImage, format: OutputFormat, jpeg_quality: u8) -> MockupResult<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            let quality = jpeg_quality.clamp(1, 100);
            JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&rgb)?;
        }
        OutputFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        }
    }
    Ok(buf)
}

/// Sniff the mime type of an encoded raster, defaulting to octet-stream.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::WebP) => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/raster.rs"]
mod tests;
