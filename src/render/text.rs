//! Greedy word wrapping and text-box sizing.

/// Inner padding between an element's edge and its text.
pub const TEXT_PADDING: f64 = 8.0;
/// Line advance as a multiple of the font size.
pub const LINE_SPACING: f64 = 1.2;
pub const MIN_FONT_PX: f64 = 8.0;
pub const MAX_FONT_PX: f64 = 96.0;

/// Break `text` into lines no wider than `max_width`.
///
/// Words are packed greedily. A word wider than the whole line is split between characters.
/// Explicit newlines start a new line. `measure` must return the rendered advance of a string.
pub fn wrap_greedy(text: &str, max_width: f32, mut measure: impl FnMut(&str) -> f32) -> Vec<String> {
    if max_width.is_nan() || max_width <= 0.0 {
        return Vec::new();
    }
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if !current.is_empty() {
                let candidate = format!("{current} {word}");
                if measure(&candidate) <= max_width {
                    current = candidate;
                    continue;
                }
                lines.push(std::mem::take(&mut current));
            }
            if measure(word) <= max_width {
                current = word.to_owned();
                continue;
            }
            let mut pieces = split_chars(word, max_width, &mut measure);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

// A single character wider than the line is still emitted on its own.
fn split_chars(word: &str, max_width: f32, measure: &mut impl FnMut(&str) -> f32) -> Vec<String> {
    let mut out = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if piece.chars().count() > 1 && measure(&piece) > max_width {
            piece.pop();
            out.push(std::mem::replace(&mut piece, ch.to_string()));
        }
    }
    if !piece.is_empty() {
        out.push(piece);
    }
    out
}

/// Font size and line budget for a text element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    pub padding: f64,
    pub font_px: f64,
    pub line_height: f64,
    pub max_lines: usize,
}

impl TextMetrics {
    /// Size text so `line_hint` lines fill an element of height `h`.
    pub fn for_box(w: f64, h: f64, line_hint: u32) -> Self {
        let padding = TEXT_PADDING.min(w / 4.0).min(h / 4.0).max(0.0);
        let inner_h = (h - 2.0 * padding).max(0.0);
        let lines = f64::from(line_hint.max(1));
        let font_px = (inner_h / (lines * LINE_SPACING)).clamp(MIN_FONT_PX, MAX_FONT_PX);
        let line_height = font_px * LINE_SPACING;
        let max_lines = if font_px > h {
            0
        } else {
            ((inner_h / line_height).floor() as usize).max(1)
        };
        Self {
            padding,
            font_px,
            line_height,
            max_lines,
        }
    }

    pub fn inner_width(&self, w: f64) -> f64 {
        (w - 2.0 * self.padding).max(0.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
