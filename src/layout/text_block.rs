//! Text block representation.
//!
//! Blocks, lines and spans are built once by the extractor and are read-only
//! afterwards. Derived block properties are computed on first access and
//! memoized.

use super::font_mapper::{detect_alignment, Alignment};
use crate::geometry::{Point, Rect};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Identifier of a block within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlockId {
    /// Zero-based page index
    pub page_index: usize,
    /// Zero-based block index within the page
    pub block_index: usize,
}

/// A uniformly styled run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    /// Text content
    pub text: String,
    /// Font name as found in the document (uninterpreted)
    pub font_name: String,
    /// Font size in points
    pub size: f32,
    /// Packed `0xRRGGBB` color
    pub color: u32,
    /// Bounding box (top-left origin)
    pub bbox: Rect,
}

impl Span {
    /// Red, green and blue channels of the color.
    pub fn rgb(&self) -> [u8; 3] {
        unpack_rgb(self.color)
    }
}

/// Pack 0-1 RGB components into `0xRRGGBB`.
///
/// # Examples
///
/// ```
/// use pdf_retext::layout::pack_rgb;
///
/// assert_eq!(pack_rgb([1.0, 0.0, 0.0]), 0xFF0000);
/// assert_eq!(pack_rgb([0.0, 0.0, 0.0]), 0x000000);
/// ```
pub fn pack_rgb(rgb: [f32; 3]) -> u32 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    (channel(rgb[0]) << 16) | (channel(rgb[1]) << 8) | channel(rgb[2])
}

/// Split `0xRRGGBB` into channels.
pub fn unpack_rgb(color: u32) -> [u8; 3] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

/// A line of spans sharing a baseline, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Bounding box of all spans
    pub bbox: Rect,
    /// Spans in reading order
    pub spans: Vec<Span>,
}

impl Line {
    /// Build a line from spans; the bounding box is their union.
    pub fn new(spans: Vec<Span>) -> Self {
        let bbox = union_all(spans.iter().map(|s| s.bbox));
        Self { bbox, spans }
    }

    /// Concatenated span text.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A paragraph-like group of lines.
#[derive(Debug, Clone)]
pub struct TextBlock {
    /// Block identifier
    pub id: BlockId,
    /// Bounding box of all lines
    pub bbox: Rect,
    /// Lines top to bottom
    pub lines: Vec<Line>,
    /// Set by the region classifier; such blocks are never erased or replaced
    pub is_in_image: bool,
    average_font_size: OnceLock<f32>,
    dominant_font: OnceLock<String>,
    dominant_color: OnceLock<u32>,
    alignment: OnceLock<Alignment>,
}

impl PartialEq for TextBlock {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.bbox == other.bbox
            && self.lines == other.lines
            && self.is_in_image == other.is_in_image
    }
}

impl TextBlock {
    /// Build a block from lines; the bounding box is their union.
    pub fn new(id: BlockId, lines: Vec<Line>) -> Self {
        let bbox = union_all(lines.iter().map(|l| l.bbox));
        Self {
            id,
            bbox,
            lines,
            is_in_image: false,
            average_font_size: OnceLock::new(),
            dominant_font: OnceLock::new(),
            dominant_color: OnceLock::new(),
            alignment: OnceLock::new(),
        }
    }

    /// Block text: span texts joined, one space after each line, trimmed.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            for span in &line.spans {
                text.push_str(&span.text);
            }
            text.push(' ');
        }
        text.trim().to_string()
    }

    /// All spans in reading order.
    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.lines.iter().flat_map(|l| l.spans.iter())
    }

    /// First span of the block.
    pub fn first_span(&self) -> Option<&Span> {
        self.spans().next()
    }

    /// Center point of the bounding box.
    pub fn center(&self) -> Point {
        self.bbox.center()
    }

    /// Mean span size, or 12 pt for a block without spans.
    pub fn average_font_size(&self) -> f32 {
        *self.average_font_size.get_or_init(|| {
            let sizes: Vec<f32> = self.spans().map(|s| s.size).collect();
            if sizes.is_empty() {
                12.0
            } else {
                sizes.iter().sum::<f32>() / sizes.len() as f32
            }
        })
    }

    /// Most frequent span font (first seen wins ties).
    pub fn dominant_font(&self) -> &str {
        self.dominant_font
            .get_or_init(|| most_frequent(self.spans().map(|s| s.font_name.clone())).unwrap_or_default())
    }

    /// Most frequent span color (first seen wins ties).
    pub fn dominant_color(&self) -> u32 {
        *self
            .dominant_color
            .get_or_init(|| most_frequent(self.spans().map(|s| s.color)).unwrap_or(0))
    }

    /// Alignment inferred from line starts.
    pub fn alignment(&self) -> Alignment {
        *self.alignment.get_or_init(|| detect_alignment(self))
    }
}

/// Most frequent item; ties go to the item seen first.
pub(crate) fn most_frequent<T, I>(items: I) -> Option<T>
where
    T: Eq + std::hash::Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, (usize, usize)> = HashMap::new();
    for (order, item) in items.into_iter().enumerate() {
        counts.entry(item).or_insert((0, order)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (ca, oa)), (_, (cb, ob))| ca.cmp(cb).then(ob.cmp(oa)))
        .map(|(item, _)| item)
}

fn union_all<I: IntoIterator<Item = Rect>>(rects: I) -> Rect {
    rects
        .into_iter()
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| Rect::new(0.0, 0.0, 0.0, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, font: &str, size: f32, x0: f32, y0: f32) -> Span {
        Span {
            text: text.to_string(),
            font_name: font.to_string(),
            size,
            color: 0x112233,
            bbox: Rect::new(x0, y0, x0 + 10.0 * text.len() as f32, y0 + size),
        }
    }

    fn block(lines: Vec<Line>) -> TextBlock {
        TextBlock::new(
            BlockId {
                page_index: 0,
                block_index: 0,
            },
            lines,
        )
    }

    #[test]
    fn test_block_text_joins_lines() {
        let b = block(vec![
            Line::new(vec![span("Hello", "Arial", 12.0, 0.0, 0.0)]),
            Line::new(vec![span("World ", "Arial", 12.0, 0.0, 14.0)]),
        ]);
        assert_eq!(b.text(), "Hello World");
        assert_eq!(b.bbox, Rect::new(0.0, 0.0, 60.0, 26.0));
    }

    #[test]
    fn test_derived_properties() {
        let b = block(vec![Line::new(vec![
            span("a", "Times", 10.0, 0.0, 0.0),
            span("b", "Arial", 14.0, 20.0, 0.0),
            span("c", "Arial", 12.0, 40.0, 0.0),
        ])]);
        assert_eq!(b.average_font_size(), 12.0);
        assert_eq!(b.dominant_font(), "Arial");
        assert_eq!(b.dominant_color(), 0x112233);
        // memoized value is stable
        assert_eq!(b.average_font_size(), 12.0);
    }

    #[test]
    fn test_most_frequent_tie_goes_to_first() {
        assert_eq!(most_frequent(vec!["b", "a", "a", "b"]), Some("b"));
        assert_eq!(most_frequent(Vec::<u32>::new()), None);
    }

    #[test]
    fn test_pack_roundtrip() {
        assert_eq!(unpack_rgb(pack_rgb([1.0, 0.5, 0.0])), [255, 128, 0]);
    }
}
