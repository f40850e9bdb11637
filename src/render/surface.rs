use std::sync::Arc;

use image::RgbaImage;
use kurbo::{Affine, Shape};

use crate::foundation::core::{
    Canvas, Rgba8, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place,
};
use crate::foundation::error::{InkframeError, InkframeResult};

/// One positioned glyph in surface coordinates relative to a run origin.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PlacedGlyph {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

/// Immediate-mode drawing surface backed by `vello_cpu`.
///
/// Draw calls are recorded in order; [`Painter::finish`] rasterizes them and returns straight
/// RGBA8.
pub(crate) struct Painter {
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
}

impl Painter {
    pub(crate) fn new(canvas: Canvas) -> InkframeResult<Self> {
        let (width, height) = canvas.size_u16()?;
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(width, height),
            width,
            height,
        })
    }

    /// Blit `img` unscaled with its top-left corner at `(x, y)`.
    pub(crate) fn draw_image(&mut self, img: &RgbaImage, x: f64, y: f64) -> InkframeResult<()> {
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return Ok(());
        }
        let paint = image_paint(img)?;
        self.ctx
            .set_transform(affine_to_cpu(Affine::translate((x, y))));
        self.ctx.set_paint(paint);
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w as f64, h as f64));
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }

    pub(crate) fn fill(&mut self, shape: &impl Shape, color: Rgba8) {
        let path = bezpath_to_cpu(&shape.to_path(0.1));
        self.ctx.set_paint(color.to_cpu());
        self.ctx.fill_path(&path);
    }

    pub(crate) fn stroke(&mut self, shape: &impl Shape, width: f64, color: Rgba8) {
        let path = bezpath_to_cpu(&shape.to_path(0.1));
        self.ctx.set_stroke(
            vello_cpu::kurbo::Stroke::new(width).with_caps(vello_cpu::kurbo::Cap::Round),
        );
        self.ctx.set_paint(color.to_cpu());
        self.ctx.stroke_path(&path);
    }

    /// Fill one glyph run with its baseline-relative origin at `(x, y)`.
    pub(crate) fn glyphs(
        &mut self,
        font: &vello_cpu::peniko::FontData,
        size_px: f32,
        color: Rgba8,
        origin: (f64, f64),
        glyphs: impl Iterator<Item = PlacedGlyph>,
    ) {
        self.ctx
            .set_transform(affine_to_cpu(Affine::translate(origin)));
        self.ctx.set_paint(color.to_cpu());
        self.ctx
            .glyph_run(font)
            .font_size(size_px)
            .fill_glyphs(glyphs.map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            }));
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    /// Rasterize every recorded draw call.
    pub(crate) fn finish(mut self) -> InkframeResult<RgbaImage> {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);

        let mut bytes = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut bytes);
        RgbaImage::from_raw(u32::from(self.width), u32::from(self.height), bytes)
            .ok_or_else(|| InkframeError::render("rendered pixmap byte length mismatch"))
    }
}

fn image_paint(img: &RgbaImage) -> InkframeResult<vello_cpu::Image> {
    let (width, height) = img.dimensions();
    let mut premul = img.as_raw().clone();
    premultiply_rgba8_in_place(&mut premul);
    let pixmap = image_premul_bytes_to_pixmap(&premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> InkframeResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| InkframeError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| InkframeError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(InkframeError::render("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
