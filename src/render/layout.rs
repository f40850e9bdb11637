use image::RgbaImage;
use image::imageops::FilterType;
use kurbo::{Rect, RoundedRect};

use crate::data::context::RenderContext;
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::layout::model::{ContentType, Element, ElementKind, LayoutDocument};
use crate::providers::IconSource;
use crate::render::fonts::{FontCache, TextShaper};
use crate::render::icons::{IconCache, draw_procedural};
use crate::render::surface::Painter;
use crate::render::text::{TextMetrics, wrap_greedy};

pub const PANEL_RADIUS: f64 = 14.0;
pub const PANEL_OUTLINE_WIDTH: f64 = 1.5;
/// White at 45 %.
pub const PANEL_FILL: Rgba8 = Rgba8::new(255, 255, 255, 115);
/// White at 70 %.
pub const PANEL_OUTLINE: Rgba8 = Rgba8::new(255, 255, 255, 178);
pub const TEXT_COLOR: Rgba8 = Rgba8::opaque(20, 22, 28);

/// Result of painting one layout.
#[derive(Debug)]
pub struct RenderOutcome {
    pub image: RgbaImage,
    pub drawn: usize,
    pub skipped: usize,
}

/// Paints a [`LayoutDocument`] over a canvas-sized background.
pub struct LayoutRenderer<'a> {
    canvas: Canvas,
    fonts: &'a FontCache,
    bitmap_icons: Option<(&'a IconCache, &'a dyn IconSource)>,
}

impl<'a> LayoutRenderer<'a> {
    pub fn new(canvas: Canvas, fonts: &'a FontCache) -> Self {
        Self {
            canvas,
            fonts,
            bitmap_icons: None,
        }
    }

    /// Prefer provider bitmaps for weather icons, falling back to vector icons.
    pub fn with_bitmap_icons(mut self, cache: &'a IconCache, source: &'a dyn IconSource) -> Self {
        self.bitmap_icons = Some((cache, source));
        self
    }

    /// Draw `doc` over `background` in element order.
    ///
    /// Elements that cannot be drawn are skipped with a warning.
    #[tracing::instrument(skip_all, fields(device = %ctx.device, elements = doc.elements.len()))]
    pub fn render(
        &self,
        background: &RgbaImage,
        doc: &LayoutDocument,
        ctx: &RenderContext,
    ) -> InkframeResult<RenderOutcome> {
        if background.dimensions() != (self.canvas.width, self.canvas.height) {
            return Err(InkframeError::render(format!(
                "background is {:?}, canvas is {}x{}",
                background.dimensions(),
                self.canvas.width,
                self.canvas.height
            )));
        }

        let mut painter = Painter::new(self.canvas)?;
        painter.draw_image(background, 0.0, 0.0)?;
        let mut shaper = TextShaper::new(self.fonts);

        let (mut drawn, mut skipped) = (0, 0);
        for (idx, el) in doc.elements.iter().enumerate() {
            match self.draw_element(&mut painter, &mut shaper, el, ctx) {
                Ok(()) => drawn += 1,
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(index = idx, kind = ?el.kind, error = %e, "skipping layout element");
                }
            }
        }

        Ok(RenderOutcome {
            image: painter.finish()?,
            drawn,
            skipped,
        })
    }

    fn draw_element(
        &self,
        p: &mut Painter,
        shaper: &mut TextShaper<'_>,
        el: &Element,
        ctx: &RenderContext,
    ) -> InkframeResult<()> {
        let rect = el.visible_rect(self.canvas)?;
        match el.kind {
            ElementKind::Box => {
                draw_panel(p, rect, el);
                Ok(())
            }
            ElementKind::Icon => self.draw_icon(p, rect, el, ctx),
            ElementKind::Text => {
                let content = el.content_type();
                let text = match content {
                    Some(t) => t.resolve(ctx),
                    None => el.text.clone().unwrap_or_default(),
                };
                if text.trim().is_empty() {
                    return Ok(());
                }
                let color = el.color.map(|c| c.to_rgba8()).unwrap_or(TEXT_COLOR);
                let hint = content.map(ContentType::line_hint).unwrap_or(1);
                draw_text(p, shaper, &text, rect, el.is_bold(), color, hint)?;
                Ok(())
            }
        }
    }

    fn draw_icon(
        &self,
        p: &mut Painter,
        rect: Rect,
        el: &Element,
        ctx: &RenderContext,
    ) -> InkframeResult<()> {
        if el.content_type() != Some(ContentType::WeatherIcon) {
            return Err(InkframeError::layout(format!(
                "icon element has unsupported type {:?}",
                el.content
            )));
        }

        if let Some((cache, source)) = self.bitmap_icons
            && let Some(code) = ctx.weather.icon_code.as_deref()
            && let Some(icon) = cache.get_or_fetch(code, source)
        {
            return draw_bitmap_icon(p, &icon, rect);
        }
        draw_procedural(p, ctx.weather.icon_kind, rect);
        Ok(())
    }
}

fn draw_panel(p: &mut Painter, rect: Rect, el: &Element) {
    let radius = PANEL_RADIUS.min(rect.width() / 2.0).min(rect.height() / 2.0);
    let fill = el
        .color
        .map(|c| c.with_default_alpha(PANEL_FILL.a))
        .unwrap_or(PANEL_FILL);
    p.fill(&RoundedRect::from_rect(rect, radius), fill);
    let inset = rect.inset(-PANEL_OUTLINE_WIDTH / 2.0);
    p.stroke(
        &RoundedRect::from_rect(inset, (radius - PANEL_OUTLINE_WIDTH / 2.0).max(0.0)),
        PANEL_OUTLINE_WIDTH,
        PANEL_OUTLINE,
    );
}

fn draw_bitmap_icon(p: &mut Painter, icon: &RgbaImage, rect: Rect) -> InkframeResult<()> {
    let (iw, ih) = icon.dimensions();
    if iw == 0 || ih == 0 {
        return Err(InkframeError::render("empty icon bitmap"));
    }
    let scale = (rect.width() / f64::from(iw)).min(rect.height() / f64::from(ih));
    let w = ((f64::from(iw) * scale).round() as u32).max(1);
    let h = ((f64::from(ih) * scale).round() as u32).max(1);
    let scaled = image::imageops::resize(icon, w, h, FilterType::Triangle);
    let x = rect.x0 + (rect.width() - f64::from(w)) / 2.0;
    let y = rect.y0 + (rect.height() - f64::from(h)) / 2.0;
    p.draw_image(&scaled, x.round(), y.round())
}

/// Wrap and draw `text` inside `rect`; returns the number of lines drawn.
pub(crate) fn draw_text(
    p: &mut Painter,
    shaper: &mut TextShaper<'_>,
    text: &str,
    rect: Rect,
    bold: bool,
    color: Rgba8,
    line_hint: u32,
) -> InkframeResult<usize> {
    let face = shaper
        .face(bold)
        .ok_or_else(|| InkframeError::render("no font available for text"))?;

    let m = TextMetrics::for_box(rect.width(), rect.height(), line_hint);
    if m.max_lines == 0 {
        return Ok(0);
    }
    let size = m.font_px as f32;
    let lines = wrap_greedy(text, m.inner_width(rect.width()) as f32, |s| {
        shaper.measure(s, size, bold)
    });
    if lines.len() > m.max_lines {
        tracing::debug!(
            total = lines.len(),
            kept = m.max_lines,
            "text clipped to element height"
        );
    }

    let mut drawn = 0;
    for (i, line) in lines.iter().take(m.max_lines).enumerate() {
        let shaped = shaper.shape_line(line, size, bold)?;
        let top = rect.y0 + m.padding + i as f64 * m.line_height + (m.line_height - m.font_px) / 2.0;
        p.glyphs(
            face.data(),
            size,
            color,
            (rect.x0 + m.padding, top),
            shaped.glyphs.into_iter(),
        );
        drawn += 1;
    }
    Ok(drawn)
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
