use image::RgbaImage;
use image::imageops::FilterType;

use crate::foundation::core::Canvas;

/// Scale `img` to cover `canvas` and center-crop to exactly its size.
///
/// Images already at the canvas size are returned untouched.
pub fn normalize_to_canvas(img: RgbaImage, canvas: Canvas) -> RgbaImage {
    let (tw, th) = (canvas.width, canvas.height);
    let (sw, sh) = img.dimensions();
    if (sw, sh) == (tw, th) {
        return img;
    }
    if sw == 0 || sh == 0 {
        return RgbaImage::new(tw, th);
    }

    let scale = (tw as f64 / sw as f64).max(th as f64 / sh as f64);
    // Rounding may land one pixel short of the target on the covering axis.
    let nw = ((sw as f64 * scale).round() as u32).max(tw);
    let nh = ((sh as f64 * scale).round() as u32).max(th);

    let resized = if (nw, nh) == (sw, sh) {
        img
    } else {
        image::imageops::resize(&img, nw, nh, FilterType::Triangle)
    };

    let crop_x = (nw - tw) / 2;
    let crop_y = (nh - th) / 2;
    image::imageops::crop_imm(&resized, crop_x, crop_y, tw, th).to_image()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/normalize.rs"]
mod tests;
