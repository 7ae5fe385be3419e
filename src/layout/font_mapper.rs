//! Font and alignment mapping.
//!
//! Source font names are reduced to a canonical family with bold/italic
//! flags by substring matching on the lowercased name, then mapped onto a
//! standard 14 face. This is a lossy heuristic: it never tries to reproduce
//! the original face, only a plausible substitute.

use super::text_block::TextBlock;
use crate::fonts::metrics::{FontFamily, FontMetrics, FontWeight};
use serde::Serialize;

/// Line-start spread below which a block is left aligned.
const LEFT_ALIGNED_SPREAD: f32 = 2.0;

/// Line-start spread above which a block is treated as centered.
const CENTERED_SPREAD: f32 = 20.0;

/// Canonical font family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CanonicalFamily {
    /// Serif faces (Times)
    Serif,
    /// Sans-serif faces (Helvetica), the default
    Sans,
    /// Monospaced faces (Courier)
    Monospace,
}

/// Result of mapping a source font name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedFont {
    /// Canonical family
    pub family: CanonicalFamily,
    /// Bold flag
    pub bold: bool,
    /// Italic/oblique flag
    pub italic: bool,
}

impl MappedFont {
    /// Metrics of the standard face for this mapping.
    pub fn metrics(&self) -> &'static FontMetrics {
        let family = match self.family {
            CanonicalFamily::Serif => FontFamily::Times,
            CanonicalFamily::Sans => FontFamily::Helvetica,
            CanonicalFamily::Monospace => FontFamily::Courier,
        };
        let weight = if self.bold {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        };
        FontMetrics::standard(family, weight, self.italic)
    }

    /// PostScript name of the standard face.
    pub fn base_font(&self) -> &'static str {
        self.metrics().name
    }
}

/// Map a source font name to a canonical face.
///
/// `times`/`serif` select serif, `courier`/`mono` select monospace, and
/// everything else is sans. Note that "sans-serif" contains "serif" and so
/// maps to serif.
///
/// # Examples
///
/// ```
/// use pdf_retext::layout::{map_font, CanonicalFamily};
///
/// let font = map_font("ABCDEF+TimesNewRoman-BoldItalic");
/// assert_eq!(font.family, CanonicalFamily::Serif);
/// assert!(font.bold && font.italic);
/// assert_eq!(font.base_font(), "Times-BoldItalic");
///
/// assert_eq!(map_font("Consolas-Mono").base_font(), "Courier");
/// assert_eq!(map_font("").base_font(), "Helvetica");
/// ```
pub fn map_font(font_name: &str) -> MappedFont {
    let lower = font_name.to_lowercase();
    let family = if lower.contains("times") || lower.contains("serif") {
        CanonicalFamily::Serif
    } else if lower.contains("courier") || lower.contains("mono") {
        CanonicalFamily::Monospace
    } else {
        CanonicalFamily::Sans
    };
    MappedFont {
        family,
        bold: lower.contains("bold"),
        italic: lower.contains("italic") || lower.contains("oblique"),
    }
}

/// Horizontal alignment of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Alignment {
    /// Lines share a left edge
    #[default]
    Left,
    /// Lines are centered
    Center,
}

/// Infer alignment from the spread of line-start x coordinates.
///
/// Fewer than two lines, or a spread under 2 pt, is left aligned; a spread
/// over 20 pt is centered; anything in between stays left.
pub fn alignment_from_line_starts(starts: &[f32]) -> Alignment {
    if starts.len() < 2 {
        return Alignment::Left;
    }
    let min = starts.iter().copied().fold(f32::INFINITY, f32::min);
    let max = starts.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let spread = max - min;
    if spread < LEFT_ALIGNED_SPREAD {
        Alignment::Left
    } else if spread > CENTERED_SPREAD {
        Alignment::Center
    } else {
        Alignment::Left
    }
}

/// Infer the alignment of a block.
pub fn detect_alignment(block: &TextBlock) -> Alignment {
    let starts: Vec<f32> = block.lines.iter().map(|l| l.bbox.x0).collect();
    alignment_from_line_starts(&starts)
}
