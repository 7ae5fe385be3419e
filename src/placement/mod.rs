//! Text placement.
//!
//! Replacement text is placed with a three-step cascade, each step used only
//! when the previous one overflows:
//!
//! 1. exact geometry: the block's box, mapped font, original size and
//!    alignment, retried once in a larger box at a smaller size
//! 2. auto-fit: a widened box in Helvetica at decreasing sizes
//! 3. manual wrap: fixed-width character wrapping that always draws
//!
//! The primitive behind steps 1 and 2 is [`insert_textbox`].

mod canvas;
mod textbox;

pub use canvas::{PageCanvas, TextOp};
pub use textbox::{insert_textbox, Fit, TextStyle};

use crate::adaptation::validation::is_placeholder;
use crate::config::PlacementConfig;
use crate::error::{Error, Result};
use crate::fonts::metrics::FontMetrics;
use crate::geometry::Rect;
use crate::layout::{map_font, Alignment, TextBlock};
use serde::Serialize;

/// Margin added around boxes too small to hold text.
const SMALL_BOX_MARGIN: f32 = 5.0;

/// Size used when a block carries no usable size.
const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Line spacing of the manual wrap, as a multiple of the size.
const WRAP_LINE_SPACING: f32 = 1.2;

/// Badge font size.
const BADGE_SIZE: f32 = 8.0;

/// Which step of the cascade placed a block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Placement {
    /// Nothing to place (blank or placeholder text)
    Skipped,
    /// Placed in the block's own geometry
    Exact {
        /// Whether the enlarged retry was needed
        retried: bool,
    },
    /// Placed by the auto-fit box
    AutoFit {
        /// Size that fitted
        size: f32,
    },
    /// Placed by manual wrapping
    ManualWrap {
        /// Lines drawn
        lines: usize,
        /// Whether lines were cut at the bottom bound
        truncated: bool,
    },
}

impl Placement {
    /// Position in the cascade (0 when skipped).
    pub fn strategy(&self) -> u8 {
        match self {
            Placement::Skipped => 0,
            Placement::Exact { .. } => 1,
            Placement::AutoFit { .. } => 2,
            Placement::ManualWrap { .. } => 3,
        }
    }
}

/// Places replacement text for blocks.
#[derive(Debug, Clone)]
pub struct PlacementEngine<'a> {
    config: &'a PlacementConfig,
}

impl<'a> PlacementEngine<'a> {
    /// Create an engine.
    pub fn new(config: &'a PlacementConfig) -> Self {
        Self { config }
    }

    /// Place `text` for `block` on `canvas`.
    ///
    /// Fails only when even the manual wrap cannot draw a line, which makes
    /// the page fatal.
    pub fn place(&self, canvas: &mut PageCanvas, block: &TextBlock, text: &str) -> Result<Placement> {
        if text.trim().is_empty() || is_placeholder(text) {
            log::debug!("Block {:?}: nothing to place", block.id);
            return Ok(Placement::Skipped);
        }

        // font and size both come from the first run
        let first = block.first_span();
        let mapped = map_font(first.map_or_else(|| block.dominant_font(), |s| s.font_name.as_str()));
        let size = first.map(|s| s.size).filter(|s| *s > 0.0).unwrap_or(DEFAULT_FONT_SIZE);
        let color = block.dominant_color();
        let base = self.base_box(&block.bbox, canvas);

        // 1. exact geometry
        let exact = TextStyle {
            font: mapped.metrics(),
            size,
            color,
            align: block.alignment(),
        };
        if insert_textbox(canvas, base, text, &exact).is_placed() {
            return Ok(Placement::Exact { retried: false });
        }
        let retry_box = Rect::new(
            base.x0,
            base.y0,
            base.x1 + self.config.retry_extra_width,
            base.y1 + self.config.retry_extra_height,
        )
        .clamp_to(canvas.width, canvas.height);
        let retry = TextStyle {
            size: size * self.config.retry_scale,
            ..exact
        };
        if insert_textbox(canvas, retry_box, text, &retry).is_placed() {
            return Ok(Placement::Exact { retried: true });
        }

        // 2. auto-fit
        let fit_box = Rect::new(
            base.x0,
            base.y0,
            base.x1 + self.config.autofit_extra_width,
            base.y1 + self.config.autofit_extra_height,
        )
        .clamp_to(canvas.width, canvas.height);
        for &fit_size in &self.config.autofit_sizes {
            let style = TextStyle {
                font: FontMetrics::helvetica(),
                size: fit_size,
                color,
                align: Alignment::Left,
            };
            if insert_textbox(canvas, fit_box, text, &style).is_placed() {
                return Ok(Placement::AutoFit { size: fit_size });
            }
        }

        // 3. manual wrap
        let (lines, truncated) = self.manual_wrap(canvas, fit_box, text, size, color);
        if lines == 0 {
            return Err(Error::PageFatal {
                page: block.id.page_index,
                reason: format!("no placement strategy could draw block {}", block.id.block_index),
            });
        }
        if truncated {
            log::warn!("Block {:?}: wrapped text cut after {} lines", block.id, lines);
        }
        Ok(Placement::ManualWrap { lines, truncated })
    }

    /// Write the runs of `block` back as they were, one line per run.
    ///
    /// Used for text inside images, which backgrounds no longer carry.
    /// Returns the number of runs drawn.
    pub fn keep_original(&self, canvas: &mut PageCanvas, block: &TextBlock) -> usize {
        let mut drawn = 0;
        for span in block.spans().filter(|s| !s.text.trim().is_empty()) {
            let font = map_font(&span.font_name).metrics();
            let size = if span.size > 0.0 { span.size } else { DEFAULT_FONT_SIZE };
            canvas.push(TextOp {
                font: font.name,
                size,
                color: span.color,
                x: span.bbox.x0,
                baseline: span.bbox.y1 + font.descender * size / 1000.0,
                text: span.text.clone(),
            });
            drawn += 1;
        }
        drawn
    }

    /// The block box, enlarged when too small to hold text, clamped to the page.
    fn base_box(&self, bbox: &Rect, canvas: &PageCanvas) -> Rect {
        let threshold = self.config.small_box_threshold;
        let rect = if bbox.width() < threshold || bbox.height() < threshold {
            Rect::new(
                bbox.x0 - SMALL_BOX_MARGIN,
                bbox.y0 - SMALL_BOX_MARGIN,
                bbox.x0 + self.config.small_box_min_width.max(bbox.width() + 2.0 * SMALL_BOX_MARGIN),
                bbox.y0 + self.config.small_box_min_height.max(bbox.height() + 2.0 * SMALL_BOX_MARGIN),
            )
        } else {
            *bbox
        };
        rect.clamp_to(canvas.width, canvas.height)
    }

    /// Greedy wrap by character count; draws while the baseline stays above
    /// the box bottom plus one line. Returns lines drawn and whether text
    /// was cut.
    fn manual_wrap(&self, canvas: &mut PageCanvas, rect: Rect, text: &str, size: f32, color: u32) -> (usize, bool) {
        let per_line = ((rect.width() / (size * self.config.wrap_char_width)).floor() as usize).max(1);
        let lines = wrap_by_chars(text, per_line);
        let line_height = size * WRAP_LINE_SPACING;
        let font = FontMetrics::helvetica();

        let mut baseline = rect.y0 + size;
        let mut drawn = 0;
        for line in &lines {
            if baseline >= rect.y1 + line_height {
                break;
            }
            canvas.push(TextOp {
                font: font.name,
                size: size * self.config.wrap_scale,
                color,
                x: rect.x0,
                baseline,
                text: line.clone(),
            });
            drawn += 1;
            baseline += line_height;
        }
        (drawn, drawn < lines.len())
    }

    /// Draw the `[Adapted: PROFILE]` badge in the bottom-right corner.
    pub fn badge(&self, canvas: &mut PageCanvas, profile: &str) {
        let text = format!("[Adapted: {}]", profile.to_uppercase());
        let font = FontMetrics::helvetica();
        let width = font.text_width(&text, BADGE_SIZE);
        canvas.push(TextOp {
            font: font.name,
            size: BADGE_SIZE,
            color: 0x666666,
            x: (canvas.width - width - 10.0).max(0.0),
            baseline: (canvas.height - 10.0).max(BADGE_SIZE),
            text,
        });
    }
}

/// Greedy word wrap to at most `per_line` characters; longer words are cut.
fn wrap_by_chars(text: &str, per_line: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > per_line {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                count = 0;
            }
            lines.push(word.drain(..per_line).collect());
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() { word.len() } else { count + 1 + word.len() };
        if needed > per_line && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            count = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            count += 1;
        }
        current.extend(word.iter());
        count += word.len();
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BlockId, Line, Span};

    fn block(bbox: Rect, size: f32, font: &str) -> TextBlock {
        TextBlock::new(
            BlockId {
                page_index: 0,
                block_index: 0,
            },
            vec![Line::new(vec![Span {
                text: "original".to_string(),
                font_name: font.to_string(),
                size,
                color: 0x336699,
                bbox,
            }])],
        )
    }

    #[test]
    fn test_wrap_by_chars() {
        assert_eq!(wrap_by_chars("aa bb cc", 5), vec!["aa bb", "cc"]);
        assert_eq!(wrap_by_chars("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert!(wrap_by_chars("   ", 3).is_empty());
    }

    #[test]
    fn test_exact_geometry_uses_mapped_font_and_color() {
        let config = PlacementConfig::default();
        let engine = PlacementEngine::new(&config);
        let mut canvas = PageCanvas::new(612.0, 792.0);
        let b = block(Rect::new(72.0, 72.0, 300.0, 90.0), 12.0, "TimesNewRomanPS-BoldMT");
        let placement = engine.place(&mut canvas, &b, "Hi there").unwrap();
        assert_eq!(placement, Placement::Exact { retried: false });
        assert_eq!(canvas.ops()[0].font, "Times-Bold");
        assert_eq!(canvas.ops()[0].color, 0x336699);
        assert_eq!(canvas.ops()[0].x, 72.0);
    }

    #[test]
    fn test_original_runs_are_written_back() {
        let config = PlacementConfig::default();
        let engine = PlacementEngine::new(&config);
        let mut canvas = PageCanvas::new(612.0, 792.0);
        let b = block(Rect::new(40.0, 100.0, 120.0, 114.0), 12.0, "Arial-BoldMT");
        assert_eq!(engine.keep_original(&mut canvas, &b), 1);

        let op = &canvas.ops()[0];
        assert_eq!(op.text, "original");
        assert_eq!(op.font, "Helvetica-Bold");
        assert_eq!((op.x, op.size, op.color), (40.0, 12.0, 0x336699));
        let descender = FontMetrics::by_name("Helvetica-Bold").unwrap().descender;
        assert!((op.baseline - (114.0 + descender * 0.012)).abs() < 1e-3);
        // the ink box of the written run sits on the original bottom edge
        assert!((op.bbox().y1 - 114.0).abs() < 1e-3);
    }

    #[test]
    fn test_small_box_is_expanded() {
        let config = PlacementConfig::default();
        let engine = PlacementEngine::new(&config);
        let canvas = PageCanvas::new(612.0, 792.0);
        let rect = engine.base_box(&Rect::new(100.0, 100.0, 105.0, 104.0), &canvas);
        assert_eq!(rect, Rect::new(95.0, 95.0, 300.0, 120.0));

        let clamped = engine.base_box(&Rect::new(500.0, 780.0, 505.0, 784.0), &canvas);
        assert_eq!(clamped, Rect::new(495.0, 775.0, 612.0, 792.0));
    }

    #[test]
    fn test_retry_at_smaller_size() {
        let config = PlacementConfig::default();
        let engine = PlacementEngine::new(&config);

        // two lines at 12pt overflow the box, one line at 9.6pt fits the retry box
        let mut canvas = PageCanvas::new(612.0, 792.0);
        let b = block(Rect::new(50.0, 50.0, 150.0, 64.0), 12.0, "Helvetica");
        let text = "alpha beta gamma delta";
        let placement = engine.place(&mut canvas, &b, text).unwrap();
        assert_eq!(placement, Placement::Exact { retried: true });
        assert!(canvas.ops().iter().all(|op| (op.size - 9.6).abs() < 1e-4));
    }

    #[test]
    fn test_skips_placeholders() {
        let config = PlacementConfig::default();
        let engine = PlacementEngine::new(&config);
        let mut canvas = PageCanvas::new(612.0, 792.0);
        let b = block(Rect::new(72.0, 72.0, 300.0, 90.0), 12.0, "Helvetica");
        assert_eq!(engine.place(&mut canvas, &b, "[ADHD]").unwrap(), Placement::Skipped);
        assert_eq!(engine.place(&mut canvas, &b, "  ").unwrap(), Placement::Skipped);
        assert!(canvas.is_empty());
    }

    #[test]
    fn test_manual_wrap_stays_within_bound() {
        let config = PlacementConfig::default();
        let engine = PlacementEngine::new(&config);
        // a box at the page corner leaves no room to grow
        let mut canvas = PageCanvas::new(200.0, 100.0);
        let b = block(Rect::new(20.0, 60.0, 180.0, 80.0), 14.0, "Helvetica");
        let text = "word ".repeat(120);
        let placement = engine.place(&mut canvas, &b, &text).unwrap();
        let Placement::ManualWrap { lines, truncated } = placement else {
            panic!("expected manual wrap, got {:?}", placement);
        };
        assert!(lines > 1);
        assert!(truncated);
        let bound = 100.0 + 14.0 * 1.2;
        assert!(canvas.ops().iter().all(|op| op.baseline < bound));
        assert!(canvas.ops().iter().all(|op| (op.size - 12.6).abs() < 1e-4));
    }

    #[test]
    fn test_exact_geometry_takes_font_from_first_run() {
        let config = PlacementConfig::default();
        let engine = PlacementEngine::new(&config);
        let mut canvas = PageCanvas::new(612.0, 792.0);
        let span = |text: &str, font: &str, x0: f32| Span {
            text: text.to_string(),
            font_name: font.to_string(),
            size: 12.0,
            color: 0,
            bbox: Rect::new(x0, 72.0, x0 + 40.0, 86.0),
        };
        let b = TextBlock::new(
            BlockId {
                page_index: 0,
                block_index: 0,
            },
            vec![Line::new(vec![
                span("Note:", "Times-Bold", 72.0),
                span("plain", "Helvetica", 112.0),
                span("words", "Helvetica", 152.0),
            ])],
        );
        assert_eq!(b.dominant_font(), "Helvetica");
        engine.place(&mut canvas, &b, "Note: new words").unwrap();
        assert_eq!(canvas.ops()[0].font, "Times-Bold");
    }

    #[test]
    fn test_badge() {
        let config = PlacementConfig::default().with_badge(true);
        let engine = PlacementEngine::new(&config);
        let mut canvas = PageCanvas::new(612.0, 792.0);
        engine.badge(&mut canvas, "esl");
        assert_eq!(canvas.ops()[0].text, "[Adapted: ESL]");
        assert_eq!(canvas.ops()[0].size, 8.0);
    }
}
