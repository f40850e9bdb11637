//! Fixed-palette quantization for colour e-ink panels.
//!
//! Floyd–Steinberg error diffusion with integer error terms and a plain left-to-right,
//! top-to-bottom scan. There is no randomness anywhere, so the output is a pure function of the
//! input image and palette. Pixels that already sit exactly on a palette entry carry zero error,
//! which makes quantizing an already-quantized image a no-op.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{InkframeError, InkframeResult};

/// Ordered list of RGB colours the panel can show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaletteSpec(Vec<[u8; 3]>);

impl PaletteSpec {
    pub fn new(colors: Vec<[u8; 3]>) -> InkframeResult<Self> {
        if colors.is_empty() {
            return Err(InkframeError::validation("palette must contain at least one colour"));
        }
        Ok(Self(colors))
    }

    /// White, black, red, yellow, blue, green.
    pub fn six_color() -> Self {
        Self(vec![
            [255, 255, 255],
            [0, 0, 0],
            [255, 0, 0],
            [255, 255, 0],
            [0, 0, 255],
            [0, 255, 0],
        ])
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.0
    }

    pub fn contains(&self, rgb: [u8; 3]) -> bool {
        self.0.contains(&rgb)
    }

    /// Nearest entry by squared Euclidean distance in RGB; ties go to the earlier entry.
    pub fn nearest(&self, r: i32, g: i32, b: i32) -> usize {
        let mut best = 0usize;
        let mut best_d = i32::MAX;
        for (i, c) in self.0.iter().enumerate() {
            let dr = r - c[0] as i32;
            let dg = g - c[1] as i32;
            let db = b - c[2] as i32;
            let d = dr * dr + dg * dg + db * db;
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best
    }
}

impl Default for PaletteSpec {
    fn default() -> Self {
        Self::six_color()
    }
}

/// Dither `img` to palette indices, one byte per pixel, row-major.
pub fn dither_indices(img: &RgbImage, palette: &PaletteSpec) -> InkframeResult<Vec<u8>> {
    let colors = palette.colors();
    if colors.is_empty() {
        return Err(InkframeError::validation("palette must contain at least one colour"));
    }
    if colors.len() > usize::from(u8::MAX) + 1 {
        return Err(InkframeError::validation("palette exceeds 256 colours"));
    }

    let (width, height) = img.dimensions();
    let (w, h) = (width as usize, height as usize);

    // i32 working buffer so diffused error can leave the 0..=255 range.
    let mut buffer: Vec<[i32; 3]> = img
        .pixels()
        .map(|p| [p[0] as i32, p[1] as i32, p[2] as i32])
        .collect();
    let mut out = vec![0u8; w * h];

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let [r, g, b] = buffer[idx].map(|c| c.clamp(0, 255));

            let ci = palette.nearest(r, g, b);
            out[idx] = ci as u8;
            let pc = colors[ci];
            let err = [r - pc[0] as i32, g - pc[1] as i32, b - pc[2] as i32];
            if err == [0, 0, 0] {
                continue;
            }

            let mut spread = |i: usize, num: i32| {
                for c in 0..3 {
                    buffer[i][c] += err[c] * num / 16;
                }
            };

            if x + 1 < w {
                spread(idx + 1, 7);
            }
            if y + 1 < h {
                if x > 0 {
                    spread(idx + w - 1, 3);
                }
                spread(idx + w, 5);
                if x + 1 < w {
                    spread(idx + w + 1, 1);
                }
            }
        }
    }

    Ok(out)
}

/// Dither `img` and expand the indices back to palette RGB.
#[tracing::instrument(level = "debug", skip_all, fields(w = img.width(), h = img.height()))]
pub fn quantize(img: &RgbImage, palette: &PaletteSpec) -> InkframeResult<RgbImage> {
    let indices = dither_indices(img, palette)?;
    let colors = palette.colors();
    let mut out = RgbImage::new(img.width(), img.height());
    for (px, &i) in out.pixels_mut().zip(indices.iter()) {
        *px = image::Rgb(colors[i as usize]);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/quantize.rs"]
mod tests;
