//! Text block extraction.
//!
//! Positioned glyphs from the interpreted page are merged in three passes:
//!
//! 1. consecutive glyphs with the same style on one baseline become spans
//! 2. spans on one baseline become lines, sorted left to right
//! 3. vertically adjacent, horizontally overlapping lines become blocks
//!
//! All thresholds are relative to the font size so the same rules hold for
//! body text and headings.

use crate::content::{GlyphRun, PageScene};
use crate::geometry::Rect;
use crate::layout::{pack_rgb, BlockId, Line, Span, TextBlock};

/// Grouping thresholds, as fractions of the font size.
#[derive(Debug, Clone, Copy)]
pub struct TextExtractionConfig {
    /// Horizontal gap above which a space is inserted between glyphs.
    pub word_gap: f32,
    /// Horizontal gap above which a span is split.
    pub span_gap: f32,
    /// Baseline difference tolerated within one span or line.
    pub baseline_tolerance: f32,
    /// Vertical gap between lines tolerated within one block.
    pub line_gap: f32,
}

impl Default for TextExtractionConfig {
    fn default() -> Self {
        Self {
            word_gap: 0.2,
            span_gap: 3.0,
            baseline_tolerance: 0.5,
            line_gap: 0.8,
        }
    }
}

/// A glyph in page coordinates, with the style of its run.
#[derive(Debug, Clone)]
struct PositionedGlyph<'a> {
    text: &'a str,
    rect: Rect,
    baseline: f32,
    font_name: &'a str,
    size: f32,
    color: u32,
}

/// Span under construction.
#[derive(Debug)]
struct SpanBuilder {
    text: String,
    bbox: Rect,
    baseline: f32,
    font_name: String,
    size: f32,
    color: u32,
}

impl SpanBuilder {
    fn start(glyph: &PositionedGlyph<'_>) -> Self {
        Self {
            text: glyph.text.to_string(),
            bbox: glyph.rect,
            baseline: glyph.baseline,
            font_name: glyph.font_name.to_string(),
            size: glyph.size,
            color: glyph.color,
        }
    }

    fn same_style(&self, glyph: &PositionedGlyph<'_>) -> bool {
        self.font_name == glyph.font_name
            && (self.size - glyph.size).abs() < 0.01
            && self.color == glyph.color
    }

    /// Append the glyph when it continues this span.
    fn try_push(&mut self, glyph: &PositionedGlyph<'_>, config: &TextExtractionConfig) -> bool {
        if !self.same_style(glyph) {
            return false;
        }
        let size = self.size.max(1.0);
        if (glyph.baseline - self.baseline).abs() > config.baseline_tolerance * size {
            return false;
        }
        let gap = glyph.rect.x0 - self.bbox.x1;
        if gap < -0.5 * size || gap > config.span_gap * size {
            return false;
        }
        if gap > config.word_gap * size && !boundary_whitespace(&self.text, glyph.text) {
            self.text.push(' ');
        }
        self.text.push_str(glyph.text);
        self.bbox = self.bbox.union(&glyph.rect);
        true
    }

    fn finish(self) -> (Span, f32) {
        let span = Span {
            text: self.text,
            font_name: self.font_name,
            size: self.size,
            color: self.color,
            bbox: self.bbox,
        };
        (span, self.baseline)
    }
}

fn boundary_whitespace(prev: &str, next: &str) -> bool {
    prev.chars().last().is_some_and(char::is_whitespace)
        || next.chars().next().is_some_and(char::is_whitespace)
}

/// Extract text blocks from an interpreted page.
///
/// Blocks come back in content order with ids numbered from zero. A page
/// without a text layer yields an empty list.
pub fn extract_blocks(scene: &PageScene) -> Vec<TextBlock> {
    extract_blocks_with_config(scene, &TextExtractionConfig::default())
}

/// [`extract_blocks`] with explicit thresholds.
pub fn extract_blocks_with_config(
    scene: &PageScene,
    config: &TextExtractionConfig,
) -> Vec<TextBlock> {
    let glyphs = positioned_glyphs(scene);
    if glyphs.is_empty() {
        return Vec::new();
    }

    let spans = build_spans(&glyphs, config);
    let lines = build_lines(spans, config);
    let blocks = build_blocks(lines, config, scene.page.index);
    log::debug!(
        "Page {}: {} glyphs grouped into {} blocks",
        scene.page.index,
        glyphs.len(),
        blocks.len()
    );
    blocks
}

fn positioned_glyphs(scene: &PageScene) -> Vec<PositionedGlyph<'_>> {
    let mut out = Vec::new();
    for run in scene.glyph_runs() {
        push_run_glyphs(run, scene, &mut out);
    }
    out
}

fn push_run_glyphs<'a>(run: &'a GlyphRun, scene: &PageScene, out: &mut Vec<PositionedGlyph<'a>>) {
    if run.font_size <= 0.0 {
        return;
    }
    let color = pack_rgb(run.color);
    for glyph in &run.glyphs {
        if glyph.text.is_empty() {
            continue;
        }
        let origin = run.matrix.transform_point(glyph.x, 0.0);
        let baseline = scene.page.user_to_page(origin.x, origin.y).y;
        out.push(PositionedGlyph {
            text: &glyph.text,
            rect: run.glyph_rect(glyph, &scene.page),
            baseline,
            font_name: &run.font_name,
            size: run.font_size,
            color,
        });
    }
}

fn build_spans(glyphs: &[PositionedGlyph<'_>], config: &TextExtractionConfig) -> Vec<(Span, f32)> {
    let mut spans = Vec::new();
    let mut current: Option<SpanBuilder> = None;
    for glyph in glyphs {
        let pushed = current.as_mut().is_some_and(|builder| builder.try_push(glyph, config));
        if !pushed {
            if let Some(done) = current.replace(SpanBuilder::start(glyph)) {
                spans.push(done.finish());
            }
        }
    }
    if let Some(done) = current {
        spans.push(done.finish());
    }
    spans.retain(|(span, _)| !span.text.trim().is_empty());
    spans
}

/// Line under construction with its baseline.
struct LineBuilder {
    baseline: f32,
    size: f32,
    spans: Vec<Span>,
}

fn build_lines(spans: Vec<(Span, f32)>, config: &TextExtractionConfig) -> Vec<Line> {
    let mut builders: Vec<LineBuilder> = Vec::new();
    for (span, baseline) in spans {
        let joins = builders.last().is_some_and(|line| {
            let size = line.size.max(span.size).max(1.0);
            (baseline - line.baseline).abs() <= config.baseline_tolerance * size
        });
        match builders.last_mut() {
            Some(line) if joins => {
                line.size = line.size.max(span.size);
                line.spans.push(span);
            },
            _ => builders.push(LineBuilder {
                baseline,
                size: span.size,
                spans: vec![span],
            }),
        }
    }

    builders
        .into_iter()
        .map(|mut line| {
            line.spans.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            separate_spans(&mut line.spans, config);
            Line::new(line.spans)
        })
        .collect()
}

/// Make word gaps between differently styled spans visible in the text.
fn separate_spans(spans: &mut [Span], config: &TextExtractionConfig) {
    for i in 1..spans.len() {
        let gap = spans[i].bbox.x0 - spans[i - 1].bbox.x1;
        let size = spans[i - 1].size.max(1.0);
        if gap > config.word_gap * size && !boundary_whitespace(&spans[i - 1].text, &spans[i].text)
        {
            spans[i - 1].text.push(' ');
        }
    }
}

fn build_blocks(lines: Vec<Line>, config: &TextExtractionConfig, page_index: usize) -> Vec<TextBlock> {
    let mut groups: Vec<Vec<Line>> = Vec::new();
    for line in lines {
        let joins = groups.last().is_some_and(|group| continues_block(group, &line, config));
        match groups.last_mut() {
            Some(group) if joins => group.push(line),
            _ => groups.push(vec![line]),
        }
    }

    groups
        .into_iter()
        .filter(|group| group.iter().any(|l| !l.text().trim().is_empty()))
        .enumerate()
        .map(|(block_index, lines)| {
            TextBlock::new(
                BlockId {
                    page_index,
                    block_index,
                },
                lines,
            )
        })
        .collect()
}

fn continues_block(group: &[Line], line: &Line, config: &TextExtractionConfig) -> bool {
    let Some(prev) = group.last() else {
        return false;
    };
    let size = line_size(prev).max(line_size(line)).max(1.0);
    let gap = line.bbox.y0 - prev.bbox.y1;
    if gap > config.line_gap * size || line.bbox.y0 < prev.bbox.y0 {
        return false;
    }
    let x0 = group.iter().map(|l| l.bbox.x0).fold(f32::INFINITY, f32::min);
    let x1 = group.iter().map(|l| l.bbox.x1).fold(f32::NEG_INFINITY, f32::max);
    line.bbox.x0 <= x1 && line.bbox.x1 >= x0
}

fn line_size(line: &Line) -> f32 {
    line.spans.iter().map(|s| s.size).fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Glyph, GlyphRun, Matrix, SceneItem};
    use crate::document::PageInfo;

    fn page() -> PageInfo {
        PageInfo {
            index: 0,
            id: (1, 0),
            media_box: Rect::new(0.0, 0.0, 612.0, 792.0),
            rotation: 0,
        }
    }

    /// A run of fixed-advance glyphs at user-space (x, y).
    fn run(text: &str, x: f32, y: f32, size: f32, font: &str) -> SceneItem {
        let glyphs = text
            .chars()
            .enumerate()
            .map(|(i, c)| Glyph {
                text: c.to_string(),
                x: i as f32 * 0.5,
                width: 0.5,
            })
            .collect();
        SceneItem::Text(GlyphRun {
            glyphs,
            matrix: Matrix::new(size, 0.0, 0.0, size, x, y),
            ascent: 0.75,
            descent: -0.25,
            font_name: font.to_string(),
            font_size: size,
            color: [0.0, 0.0, 0.0],
            alpha: 1.0,
            render_mode: 0,
        })
    }

    fn scene(items: Vec<SceneItem>) -> PageScene {
        PageScene {
            page: page(),
            items,
        }
    }

    #[test]
    fn test_single_line_block() {
        let blocks = extract_blocks(&scene(vec![run("Hello World", 72.0, 720.0, 12.0, "Helvetica")]));
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text(), "Hello World");
        assert_eq!(blocks[0].lines.len(), 1);
        let bbox = blocks[0].bbox;
        assert!((bbox.x0 - 72.0).abs() < 0.01);
        assert!((bbox.y0 - 63.0).abs() < 0.01);
        assert!((bbox.y1 - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_word_gap_inserts_space() {
        // "Hello" ends at 72 + 5 * 6 = 102, "World" starts 4pt later
        let blocks = extract_blocks(&scene(vec![
            run("Hello", 72.0, 720.0, 12.0, "Helvetica"),
            run("World", 106.0, 720.0, 12.0, "Helvetica"),
        ]));
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text(), "Hello World");
        assert_eq!(blocks[0].spans().count(), 1);
    }

    #[test]
    fn test_style_change_starts_new_span() {
        let blocks = extract_blocks(&scene(vec![
            run("Bold", 72.0, 720.0, 12.0, "Helvetica-Bold"),
            run("text", 100.0, 720.0, 12.0, "Helvetica"),
        ]));
        assert_eq!(blocks.len(), 1);
        let spans: Vec<_> = blocks[0].spans().collect();
        assert_eq!(spans.len(), 2);
        assert_eq!(blocks[0].text(), "Bold text");
    }

    #[test]
    fn test_paragraph_and_separate_block() {
        let blocks = extract_blocks(&scene(vec![
            run("First line", 72.0, 720.0, 12.0, "Times-Roman"),
            run("Second line", 72.0, 706.0, 12.0, "Times-Roman"),
            run("Far below", 72.0, 500.0, 12.0, "Times-Roman"),
        ]));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text(), "First line Second line");
        assert_eq!(blocks[1].text(), "Far below");
        assert_eq!(blocks[1].id.block_index, 1);
    }

    #[test]
    fn test_whitespace_only_and_empty_pages() {
        assert!(extract_blocks(&scene(vec![])).is_empty());
        assert!(extract_blocks(&scene(vec![run("   ", 72.0, 720.0, 12.0, "Helvetica")])).is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let s = scene(vec![
            run("Alpha", 72.0, 720.0, 12.0, "Helvetica"),
            run("Beta", 300.0, 720.0, 12.0, "Helvetica"),
        ]);
        assert_eq!(extract_blocks(&s), extract_blocks(&s));
    }
}
