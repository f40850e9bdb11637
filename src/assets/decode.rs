use std::io::Cursor;

use anyhow::Context;
use image::RgbaImage;

use crate::foundation::error::InkframeResult;

/// Decode any supported raster format to straight RGBA8.
pub fn decode_image(bytes: &[u8]) -> InkframeResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(dyn_img.to_rgba8())
}

/// Encode straight RGBA8 as PNG, dropping alpha when every pixel is opaque.
pub fn encode_png(img: &RgbaImage) -> InkframeResult<Vec<u8>> {
    let mut buf = Vec::new();
    if img.pixels().all(|p| p[3] == 255) {
        let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
        image::DynamicImage::ImageRgb8(rgb)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode png")?;
    } else {
        image::DynamicImage::ImageRgba8(img.clone())
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode png")?;
    }
    Ok(buf)
}

pub fn encode_png_rgb(img: &image::RgbImage) -> InkframeResult<Vec<u8>> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
