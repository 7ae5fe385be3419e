//! The fitting primitive: wrap text into a box or report how much is missing.

use super::canvas::{PageCanvas, TextOp};
use crate::fonts::metrics::{wrap_text, FontMetrics};
use crate::geometry::Rect;
use crate::layout::Alignment;

/// Result of fitting text into a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fit {
    /// The text was placed; `spare` points of height are left over
    Placed {
        /// Unused height in points
        spare: f32,
    },
    /// Nothing was placed; the text needs `deficit` more points of height
    Overflow {
        /// Missing height in points
        deficit: f32,
    },
}

impl Fit {
    /// Whether the text was placed.
    pub fn is_placed(&self) -> bool {
        matches!(self, Fit::Placed { .. })
    }
}

/// Style of a text box.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    /// Font metrics (and name)
    pub font: &'static FontMetrics,
    /// Font size in points
    pub size: f32,
    /// Packed `0xRRGGBB` color
    pub color: u32,
    /// Horizontal alignment
    pub align: Alignment,
}

/// Wrap `text` into `rect` and append the lines to `canvas`.
///
/// Lines are spaced by the font's line height, the first baseline one
/// ascender below the top edge. The canvas is only touched when every line
/// fits; otherwise the missing height is reported.
///
/// # Examples
///
/// ```
/// use pdf_retext::fonts::metrics::FontMetrics;
/// use pdf_retext::geometry::Rect;
/// use pdf_retext::layout::Alignment;
/// use pdf_retext::placement::{insert_textbox, Fit, PageCanvas, TextStyle};
///
/// let mut canvas = PageCanvas::new(612.0, 792.0);
/// let style = TextStyle {
///     font: FontMetrics::helvetica(),
///     size: 12.0,
///     color: 0,
///     align: Alignment::Left,
/// };
/// let fit = insert_textbox(&mut canvas, Rect::new(72.0, 72.0, 300.0, 100.0), "Hi there", &style);
/// assert!(fit.is_placed());
/// assert_eq!(canvas.len(), 1);
///
/// let tiny = insert_textbox(&mut canvas, Rect::new(72.0, 72.0, 300.0, 75.0), "Hi there", &style);
/// assert!(matches!(tiny, Fit::Overflow { .. }));
/// assert_eq!(canvas.len(), 1);
/// ```
pub fn insert_textbox(canvas: &mut PageCanvas, rect: Rect, text: &str, style: &TextStyle) -> Fit {
    let metrics = style.font;
    let size = style.size;
    let line_height = metrics.line_height(size);
    let width = rect.width();

    if width <= 0.0 || size <= 0.0 {
        return Fit::Overflow {
            deficit: line_height.max(1.0),
        };
    }

    let lines = wrap_text(metrics, text, size, width);
    let needed = lines.len() as f32 * line_height;
    let spare = rect.height() - needed;
    if spare < 0.0 {
        return Fit::Overflow { deficit: -spare };
    }
    if lines.iter().any(|(_, w)| *w > width + 0.01) {
        // a single glyph wider than the box
        return Fit::Overflow {
            deficit: line_height,
        };
    }

    let first_baseline = rect.y0 + metrics.ascender * size / 1000.0;
    for (i, (line, line_width)) in lines.into_iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let x = match style.align {
            Alignment::Left => rect.x0,
            Alignment::Center => rect.x0 + (width - line_width) / 2.0,
        };
        canvas.push(TextOp {
            font: metrics.name,
            size,
            color: style.color,
            x,
            baseline: first_baseline + i as f32 * line_height,
            text: line,
        });
    }
    Fit::Placed { spare }
}
