//! Text rasterizer - renders glyph runs using tiny-skia.
//!
//! Glyph outlines are not available for most fonts, so every glyph is drawn
//! as a box from the baseline up to a height that depends on the character
//! class (cap height for capitals and digits, x-height for lowercase).

use super::create_paint;
use crate::content::GlyphRun;
use tiny_skia::{PathBuilder, Pixmap, Transform};

/// Rasterizer for glyph runs.
#[derive(Debug, Default)]
pub struct TextRasterizer;

impl TextRasterizer {
    /// Create a new text rasterizer.
    pub fn new() -> Self {
        Self
    }

    /// Draw a run. `base` maps user space to pixels.
    pub fn draw(&self, pixmap: &mut Pixmap, run: &GlyphRun, base: Transform) {
        if !run.is_visible() || run.glyphs.is_empty() {
            return;
        }
        let m = &run.matrix;
        let transform = base.pre_concat(Transform::from_row(m.a, m.b, m.c, m.d, m.e, m.f));
        let paint = create_paint(run.color, run.alpha);

        let mut pb = PathBuilder::new();
        for glyph in &run.glyphs {
            let Some(ch) = glyph.text.chars().next() else {
                continue;
            };
            if ch.is_whitespace() || glyph.width <= 0.0 {
                continue;
            }
            let top = run.ascent * glyph_height_ratio(ch);
            let left = glyph.x + glyph.width * 0.1;
            let right = glyph.x + glyph.width * 0.9;
            if let Some(rect) = tiny_skia::Rect::from_ltrb(left, 0.0, right, top) {
                pb.push_rect(rect);
            }
        }
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, &paint, tiny_skia::FillRule::Winding, transform, None);
        }
    }
}

/// Box height as a fraction of the ascent.
fn glyph_height_ratio(ch: char) -> f32 {
    if ch.is_uppercase() || ch.is_ascii_digit() {
        0.9
    } else if ch.is_lowercase() {
        0.65
    } else {
        0.75
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_classes() {
        assert_eq!(glyph_height_ratio('A'), 0.9);
        assert_eq!(glyph_height_ratio('7'), 0.9);
        assert_eq!(glyph_height_ratio('x'), 0.65);
        assert_eq!(glyph_height_ratio('!'), 0.75);
    }
}
