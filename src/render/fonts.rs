use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::config::FontPaths;
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::render::surface::PlacedGlyph;

const SYSTEM_SANS_FAMILIES: &[&str] = &[
    "Roboto",
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Arial",
    "Helvetica",
];

/// A loaded font face: raw bytes plus the handle the rasterizer draws with.
#[derive(Clone)]
pub struct FontFace {
    bytes: Arc<Vec<u8>>,
    index: u32,
    data: vello_cpu::peniko::FontData,
}

impl FontFace {
    pub fn from_bytes(bytes: Vec<u8>, index: u32) -> Self {
        let bytes = Arc::new(bytes);
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
            index,
        );
        Self { bytes, index, data }
    }

    pub fn from_file(path: &Path) -> InkframeResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        Ok(Self::from_bytes(bytes, 0))
    }

    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    pub(crate) fn data(&self) -> &vello_cpu::peniko::FontData {
        &self.data
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("len", &self.bytes.len())
            .field("index", &self.index)
            .finish()
    }
}

/// Regular and bold faces shared by every render.
///
/// Either face may be missing. Text falls back to whichever face exists, and is skipped when
/// neither does.
#[derive(Clone, Debug, Default)]
pub struct FontCache {
    regular: Option<FontFace>,
    bold: Option<FontFace>,
}

impl FontCache {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_faces(regular: Option<FontFace>, bold: Option<FontFace>) -> Self {
        Self { regular, bold }
    }

    /// Load configured font files, falling back to a system sans-serif face.
    ///
    /// Never fails; missing fonts only disable text drawing.
    pub fn load(paths: &FontPaths) -> Self {
        let from_path = |p: Option<&Path>| {
            let p = p?;
            match FontFace::from_file(p) {
                Ok(face) => Some(face),
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "font file unavailable");
                    None
                }
            }
        };

        let mut regular = from_path(paths.regular.as_deref());
        let mut bold = from_path(paths.bold.as_deref());

        if paths.system_fallback && regular.is_none() {
            let db = system_font_db();
            regular = query_system_face(&db, usvg::fontdb::Weight::NORMAL);
            if bold.is_none() {
                bold = query_system_face(&db, usvg::fontdb::Weight::BOLD);
            }
        }

        if regular.is_none() && bold.is_none() {
            tracing::warn!("no fonts available; text elements will be skipped");
        } else {
            tracing::debug!(
                regular = regular.is_some(),
                bold = bold.is_some(),
                "fonts loaded"
            );
        }
        Self { regular, bold }
    }

    pub fn is_empty(&self) -> bool {
        self.regular.is_none() && self.bold.is_none()
    }

    /// The face to draw with, falling back across weights.
    pub fn face(&self, bold: bool) -> Option<&FontFace> {
        if bold {
            self.bold.as_ref().or(self.regular.as_ref())
        } else {
            self.regular.as_ref().or(self.bold.as_ref())
        }
    }
}

fn system_font_db() -> usvg::fontdb::Database {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    db
}

fn query_system_face(db: &usvg::fontdb::Database, weight: usvg::fontdb::Weight) -> Option<FontFace> {
    use usvg::fontdb::{Family, Query, Stretch, Style};

    let mut families = vec![Family::SansSerif];
    families.extend(SYSTEM_SANS_FAMILIES.iter().map(|n| Family::Name(n)));

    let id = families
        .iter()
        .find_map(|family| {
            db.query(&Query {
                families: std::slice::from_ref(family),
                weight,
                stretch: Stretch::Normal,
                style: Style::Normal,
            })
        })
        .or_else(|| db.faces().next().map(|f| f.id))?;

    let info = db.face(id)?;
    // `query` returns the closest weight; a regular face is no bold face.
    if weight == usvg::fontdb::Weight::BOLD && info.weight.0 < 600 {
        return None;
    }
    tracing::debug!(
        family = info.families.first().map(|(n, _)| n.as_str()).unwrap_or(""),
        weight = info.weight.0,
        "using system font"
    );
    db.with_face_data(id, |data, index| FontFace::from_bytes(data.to_vec(), index))
}

/// One shaped line, positioned relative to its top-left corner.
pub(crate) struct ShapedLine {
    pub width: f32,
    pub glyphs: Vec<PlacedGlyph>,
}

/// Per-render text shaping state.
///
/// Parley contexts are mutable and not shared across threads, so each render builds its own.
pub(crate) struct TextShaper<'a> {
    fonts: &'a FontCache,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    regular_family: Option<String>,
    bold_family: Option<String>,
}

impl<'a> TextShaper<'a> {
    pub(crate) fn new(fonts: &'a FontCache) -> Self {
        let mut font_ctx = parley::FontContext::default();
        let regular_family = fonts
            .regular
            .as_ref()
            .and_then(|f| register_face(&mut font_ctx, f));
        let bold_family = fonts
            .bold
            .as_ref()
            .and_then(|f| register_face(&mut font_ctx, f));
        Self {
            fonts,
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            regular_family,
            bold_family,
        }
    }

    /// Face used for `bold` text, or `None` when no font is loaded.
    pub(crate) fn face(&self, bold: bool) -> Option<&'a FontFace> {
        self.fonts.face(bold)
    }

    fn family_and_weight(&self, bold: bool) -> Option<(String, parley::style::FontWeight)> {
        let use_bold = if bold {
            self.bold_family.is_some() || self.regular_family.is_none()
        } else {
            self.regular_family.is_none()
        };
        let family = if use_bold {
            self.bold_family.clone()
        } else {
            self.regular_family.clone()
        }?;
        let weight = if use_bold {
            parley::style::FontWeight::BOLD
        } else {
            parley::style::FontWeight::NORMAL
        };
        Some((family, weight))
    }

    /// Shape a single line of text without wrapping.
    pub(crate) fn shape_line(
        &mut self,
        text: &str,
        size_px: f32,
        bold: bool,
    ) -> InkframeResult<ShapedLine> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(InkframeError::render("text size must be finite and > 0"));
        }
        let (family, weight) = self
            .family_and_weight(bold)
            .ok_or_else(|| InkframeError::render("no font registered for text shaping"))?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(weight));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.positioned_glyphs().map(|g| PlacedGlyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
            }
        }
        Ok(ShapedLine {
            width: layout.width(),
            glyphs,
        })
    }

    /// Advance width of `text`; zero when nothing can be shaped.
    pub(crate) fn measure(&mut self, text: &str, size_px: f32, bold: bool) -> f32 {
        self.shape_line(text, size_px, bold)
            .map(|l| l.width)
            .unwrap_or(0.0)
    }
}

fn register_face(font_ctx: &mut parley::FontContext, face: &FontFace) -> Option<String> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(face.bytes().to_vec()), None);
    let family_id = families.first().map(|(id, _)| *id)?;
    font_ctx
        .collection
        .family_name(family_id)
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "../../tests/unit/render/fonts.rs"]
mod tests;
