use image::RgbaImage;
use kurbo::{BezPath, Circle, Line, Point, Rect};

use crate::foundation::core::{Canvas, Rgba8};
use crate::render::fonts::{FontCache, TextShaper};
use crate::render::layout::draw_text;
use crate::render::surface::Painter;

pub const PLACEHOLDER_BACKGROUND: Rgba8 = Rgba8::opaque(52, 58, 70);
const MARK: Rgba8 = Rgba8::opaque(255, 196, 0);
const LABEL: Rgba8 = Rgba8::opaque(236, 238, 242);

/// Canvas-sized stand-in used when no background could be resolved.
///
/// A solid field with a warning mark and, when a font is available, `label` underneath.
pub fn placeholder_image(canvas: Canvas, fonts: &FontCache, label: &str) -> RgbaImage {
    match draw_placeholder(canvas, fonts, label) {
        Ok(img) => img,
        Err(e) => {
            tracing::error!(error = %e, "placeholder rasterization failed; using a flat fill");
            let c = PLACEHOLDER_BACKGROUND;
            RgbaImage::from_pixel(canvas.width, canvas.height, image::Rgba([c.r, c.g, c.b, 255]))
        }
    }
}

fn draw_placeholder(
    canvas: Canvas,
    fonts: &FontCache,
    label: &str,
) -> crate::foundation::error::InkframeResult<RgbaImage> {
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    let mut p = Painter::new(canvas)?;
    p.fill(&canvas.rect(), PLACEHOLDER_BACKGROUND);

    let s = w.min(h) * 0.22;
    let cx = w / 2.0;
    let top = h * 0.5 - s * 0.9;
    let mut tri = BezPath::new();
    tri.move_to(Point::new(cx, top));
    tri.line_to(Point::new(cx + s * 0.58, top + s));
    tri.line_to(Point::new(cx - s * 0.58, top + s));
    tri.close_path();
    p.fill(&tri, MARK);
    p.stroke(
        &Line::new(Point::new(cx, top + s * 0.32), Point::new(cx, top + s * 0.66)),
        s * 0.09,
        PLACEHOLDER_BACKGROUND,
    );
    p.fill(&Circle::new(Point::new(cx, top + s * 0.82), s * 0.055), PLACEHOLDER_BACKGROUND);

    if !fonts.is_empty() && !label.is_empty() {
        let mut shaper = TextShaper::new(fonts);
        let band = Rect::new(w * 0.1, top + s * 1.15, w * 0.9, top + s * 1.15 + h * 0.14);
        if let Err(e) = draw_text(&mut p, &mut shaper, label, band, true, LABEL, 1) {
            tracing::warn!(error = %e, "placeholder label skipped");
        }
    }
    p.finish()
}
