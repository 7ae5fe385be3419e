//! Metrics for the standard 14 fonts.
//!
//! Replacement text is always written with a standard font, so these tables
//! drive every width and line-height computation in the placement engine.
//! They also supply widths for extracted simple fonts that omit `/Widths`.

use std::collections::HashMap;

/// Font family of a standard font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFamily {
    /// Helvetica (sans-serif)
    Helvetica,
    /// Times (serif)
    Times,
    /// Courier (monospace)
    Courier,
}

/// Font weight classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    /// Normal weight
    #[default]
    Normal,
    /// Bold weight
    Bold,
}

/// Metrics of one standard font, in 1/1000 em.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// PostScript name, e.g. "Helvetica-Bold"
    pub name: &'static str,
    /// Font family
    pub family: FontFamily,
    /// Font weight
    pub weight: FontWeight,
    /// Whether the face is italic/oblique
    pub italic: bool,
    /// Ascender height (above baseline)
    pub ascender: f32,
    /// Descender depth (below baseline, negative)
    pub descender: f32,
    /// Cap height
    pub cap_height: f32,
    /// x-height
    pub x_height: f32,
    widths: FontWidths,
}

#[derive(Debug, Clone)]
enum FontWidths {
    Proportional(HashMap<char, f32>),
    Monospace(f32),
}

/// Width used for characters missing from a table.
const DEFAULT_WIDTH: f32 = 500.0;

impl FontMetrics {
    /// Metrics for a family/weight/style combination.
    pub fn standard(family: FontFamily, weight: FontWeight, italic: bool) -> &'static FontMetrics {
        let index = match family {
            FontFamily::Helvetica => 0,
            FontFamily::Times => 4,
            FontFamily::Courier => 8,
        } + match (weight, italic) {
            (FontWeight::Normal, false) => 0,
            (FontWeight::Bold, false) => 1,
            (FontWeight::Normal, true) => 2,
            (FontWeight::Bold, true) => 3,
        };
        &STANDARD_FONTS[index]
    }

    /// Helvetica regular, the default face.
    pub fn helvetica() -> &'static FontMetrics {
        Self::standard(FontFamily::Helvetica, FontWeight::Normal, false)
    }

    /// Look up a standard font by PostScript name.
    ///
    /// Subset prefixes (`ABCDEF+`) are ignored and the usual metric-compatible
    /// aliases (Arial, Times New Roman, Courier New) resolve to their standard
    /// counterpart.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_retext::fonts::metrics::FontMetrics;
    ///
    /// assert_eq!(FontMetrics::by_name("Times-Bold").unwrap().name, "Times-Bold");
    /// assert_eq!(FontMetrics::by_name("ABCDEF+Arial,Bold").unwrap().name, "Helvetica-Bold");
    /// assert!(FontMetrics::by_name("Wingdings").is_none());
    /// ```
    pub fn by_name(name: &str) -> Option<&'static FontMetrics> {
        let name = match name.split_once('+') {
            Some((prefix, rest)) if prefix.len() == 6 => rest,
            _ => name,
        };
        if let Some(exact) = STANDARD_FONTS.iter().find(|m| m.name == name) {
            return Some(exact);
        }

        let lower = name.to_lowercase();
        let family = if lower.starts_with("arial") || lower.starts_with("helvetica") {
            FontFamily::Helvetica
        } else if lower.starts_with("times") {
            FontFamily::Times
        } else if lower.starts_with("courier") {
            FontFamily::Courier
        } else {
            return None;
        };
        let weight = if lower.contains("bold") {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        };
        let italic = lower.contains("italic") || lower.contains("oblique");
        Some(Self::standard(family, weight, italic))
    }

    /// Width of a character in font units.
    pub fn char_width(&self, ch: char) -> f32 {
        match &self.widths {
            FontWidths::Proportional(widths) => *widths.get(&ch).unwrap_or(&DEFAULT_WIDTH),
            FontWidths::Monospace(width) => *width,
        }
    }

    /// Width of a string in points at the given size.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: f32 = text.chars().map(|c| self.char_width(c)).sum();
        units * font_size / 1000.0
    }

    /// Distance between successive baselines at the given size.
    pub fn line_height(&self, font_size: f32) -> f32 {
        (self.ascender - self.descender) * font_size / 1000.0 * 1.2
    }
}

/// Wrap text into lines no wider than `max_width`.
///
/// Explicit newlines start a new line. Words wider than the box are broken
/// at character boundaries. Returns `(line, width)` pairs.
pub fn wrap_text(
    metrics: &FontMetrics,
    text: &str,
    font_size: f32,
    max_width: f32,
) -> Vec<(String, f32)> {
    let space_width = metrics.text_width(" ", font_size);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0;

        for word in paragraph.split_whitespace() {
            let word_width = metrics.text_width(word, font_size);

            if current.is_empty() && word_width <= max_width {
                current.push_str(word);
                current_width = word_width;
            } else if !current.is_empty() && current_width + space_width + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width += space_width + word_width;
            } else if word_width <= max_width {
                lines.push((std::mem::take(&mut current), current_width));
                current.push_str(word);
                current_width = word_width;
            } else {
                if !current.is_empty() {
                    lines.push((std::mem::take(&mut current), current_width));
                }
                current_width = 0.0;
                for ch in word.chars() {
                    let w = metrics.char_width(ch) * font_size / 1000.0;
                    if !current.is_empty() && current_width + w > max_width {
                        lines.push((std::mem::take(&mut current), current_width));
                        current_width = 0.0;
                    }
                    current.push(ch);
                    current_width += w;
                }
            }
        }

        lines.push((current, current_width));
    }

    // Blank paragraphs at the end carry no ink.
    while lines.len() > 1 && lines.last().is_some_and(|(l, _)| l.is_empty()) {
        lines.pop();
    }
    lines
}

lazy_static::lazy_static! {
    static ref STANDARD_FONTS: Vec<FontMetrics> = build_standard_fonts();
}

fn build_standard_fonts() -> Vec<FontMetrics> {
    use FontFamily::*;
    use FontWeight::*;

    let faces: [(&'static str, FontFamily, FontWeight, bool); 12] = [
        ("Helvetica", Helvetica, Normal, false),
        ("Helvetica-Bold", Helvetica, Bold, false),
        ("Helvetica-Oblique", Helvetica, Normal, true),
        ("Helvetica-BoldOblique", Helvetica, Bold, true),
        ("Times-Roman", Times, Normal, false),
        ("Times-Bold", Times, Bold, false),
        ("Times-Italic", Times, Normal, true),
        ("Times-BoldItalic", Times, Bold, true),
        ("Courier", Courier, Normal, false),
        ("Courier-Bold", Courier, Bold, false),
        ("Courier-Oblique", Courier, Normal, true),
        ("Courier-BoldOblique", Courier, Bold, true),
    ];

    faces
        .into_iter()
        .map(|(name, family, weight, italic)| {
            let (ascender, descender, cap_height, x_height) = vertical_metrics(family, weight);
            let widths = match family {
                Courier => FontWidths::Monospace(600.0),
                _ => FontWidths::Proportional(proportional_widths(family, weight)),
            };
            FontMetrics {
                name,
                family,
                weight,
                italic,
                ascender,
                descender,
                cap_height,
                x_height,
                widths,
            }
        })
        .collect()
}

/// (ascender, descender, cap height, x-height)
fn vertical_metrics(family: FontFamily, weight: FontWeight) -> (f32, f32, f32, f32) {
    match (family, weight) {
        (FontFamily::Helvetica, FontWeight::Normal) => (718.0, -207.0, 718.0, 523.0),
        (FontFamily::Helvetica, FontWeight::Bold) => (718.0, -207.0, 718.0, 532.0),
        (FontFamily::Times, FontWeight::Normal) => (683.0, -217.0, 662.0, 450.0),
        (FontFamily::Times, FontWeight::Bold) => (676.0, -205.0, 676.0, 461.0),
        (FontFamily::Courier, FontWeight::Normal) => (629.0, -157.0, 562.0, 426.0),
        (FontFamily::Courier, FontWeight::Bold) => (626.0, -142.0, 562.0, 439.0),
    }
}

const HELVETICA_UPPER: [u16; 26] = [
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667,
    611, 722, 667, 944, 667, 667, 611,
];
const HELVETICA_BOLD_UPPER: [u16; 26] = [
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667,
    611, 722, 667, 944, 667, 667, 611,
];
const HELVETICA_LOWER: [u16; 26] = [
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500,
];
const HELVETICA_BOLD_LOWER: [u16; 26] = [
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
    333, 611, 556, 778, 556, 556, 500,
];
const TIMES_UPPER: [u16; 26] = [
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, 556, 722, 667, 556,
    611, 722, 722, 944, 722, 722, 611,
];
const TIMES_BOLD_UPPER: [u16; 26] = [
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778, 611, 778, 722, 556,
    667, 722, 722, 1000, 722, 722, 667,
];
const TIMES_LOWER: [u16; 26] = [
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, 500, 500, 333, 389,
    278, 500, 500, 722, 500, 500, 444,
];
const TIMES_BOLD_LOWER: [u16; 26] = [
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500, 556, 556, 444, 389,
    333, 556, 500, 722, 500, 500, 444,
];

/// Punctuation shared by the proportional faces.
const PUNCTUATION: &[(char, u16)] = &[
    (';', 278),
    ('!', 333),
    ('?', 500),
    ('\'', 222),
    ('"', 400),
    ('(', 333),
    (')', 333),
    ('[', 333),
    (']', 333),
    ('{', 333),
    ('}', 333),
    ('/', 278),
    ('\\', 278),
    ('@', 800),
    ('#', 556),
    ('$', 556),
    ('%', 889),
    ('^', 500),
    ('&', 722),
    ('*', 389),
    ('+', 584),
    ('=', 584),
    ('<', 584),
    ('>', 584),
    ('|', 280),
    ('`', 333),
    ('~', 584),
    ('_', 556),
    ('\u{2019}', 222),
    ('\u{2018}', 222),
    ('\u{201C}', 333),
    ('\u{201D}', 333),
    ('\u{2013}', 556),
    ('\u{2014}', 1000),
    ('\u{2022}', 350),
];

fn proportional_widths(family: FontFamily, weight: FontWeight) -> HashMap<char, f32> {
    let bold = weight == FontWeight::Bold;
    let (upper, lower) = match (family, bold) {
        (FontFamily::Times, false) => (&TIMES_UPPER, &TIMES_LOWER),
        (FontFamily::Times, true) => (&TIMES_BOLD_UPPER, &TIMES_BOLD_LOWER),
        (_, false) => (&HELVETICA_UPPER, &HELVETICA_LOWER),
        (_, true) => (&HELVETICA_BOLD_UPPER, &HELVETICA_BOLD_LOWER),
    };
    let (space, period, colon) = match family {
        FontFamily::Times => (250.0, 250.0, if bold { 333.0 } else { 278.0 }),
        _ => (278.0, 278.0, if bold { 333.0 } else { 278.0 }),
    };

    let mut widths = HashMap::new();
    widths.insert(' ', space);
    widths.insert('\u{00A0}', space);
    widths.insert('.', period);
    widths.insert(',', period);
    widths.insert(':', colon);
    widths.insert('-', 333.0);
    for (ch, w) in PUNCTUATION {
        widths.insert(*ch, *w as f32);
    }
    for digit in '0'..='9' {
        widths.insert(digit, if family == FontFamily::Times { 500.0 } else { 556.0 });
    }
    for (i, ch) in ('A'..='Z').enumerate() {
        widths.insert(ch, upper[i] as f32);
    }
    for (i, ch) in ('a'..='z').enumerate() {
        widths.insert(ch, lower[i] as f32);
    }
    widths
}
