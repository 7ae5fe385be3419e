//! Positioned text awaiting output.

use crate::fonts::metrics::FontMetrics;
use crate::geometry::Rect;

/// One line of text drawn at a baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    /// Standard 14 font name
    pub font: &'static str,
    /// Font size in points
    pub size: f32,
    /// Packed `0xRRGGBB` color
    pub color: u32,
    /// Left edge in page points
    pub x: f32,
    /// Baseline in page points (top-left origin)
    pub baseline: f32,
    /// Text of the line
    pub text: String,
}

impl TextOp {
    /// Approximate ink box of the line.
    pub fn bbox(&self) -> Rect {
        let metrics = FontMetrics::by_name(self.font).unwrap_or_else(FontMetrics::helvetica);
        let width = metrics.text_width(&self.text, self.size);
        Rect::new(
            self.x,
            self.baseline - metrics.ascender * self.size / 1000.0,
            self.x + width,
            self.baseline - metrics.descender * self.size / 1000.0,
        )
    }
}

/// Text placed on one output page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCanvas {
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    ops: Vec<TextOp>,
}

impl PageCanvas {
    /// An empty canvas.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// Add a line.
    pub fn push(&mut self, op: TextOp) {
        self.ops.push(op);
    }

    /// Lines in drawing order.
    pub fn ops(&self) -> &[TextOp] {
        &self.ops
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing was placed.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Fonts used, in first-use order.
    pub fn fonts(&self) -> Vec<&'static str> {
        let mut fonts: Vec<&'static str> = Vec::new();
        for op in &self.ops {
            if !fonts.contains(&op.font) {
                fonts.push(op.font);
            }
        }
        fonts
    }

    /// All placed text, one line per op.
    pub fn text(&self) -> String {
        self.ops.iter().map(|op| op.text.as_str()).collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(font: &'static str, text: &str) -> TextOp {
        TextOp {
            font,
            size: 10.0,
            color: 0,
            x: 10.0,
            baseline: 20.0,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_fonts_in_first_use_order() {
        let mut canvas = PageCanvas::new(100.0, 100.0);
        canvas.push(op("Times-Roman", "a"));
        canvas.push(op("Helvetica", "b"));
        canvas.push(op("Times-Roman", "c"));
        assert_eq!(canvas.fonts(), vec!["Times-Roman", "Helvetica"]);
        assert_eq!(canvas.text(), "a\nb\nc");
    }

    #[test]
    fn test_op_bbox() {
        let bbox = op("Courier", "abcd").bbox();
        assert!((bbox.width() - 24.0).abs() < 1e-3);
        assert!(bbox.y0 < 20.0 && bbox.y1 > 20.0);
    }
}
