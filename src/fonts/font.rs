//! Font dictionaries as seen by the content interpreter.

use super::cmap::{parse_tounicode_cmap, CMap};
use super::encoding::{glyph_name_to_unicode, winansi_to_unicode};
use super::metrics::FontMetrics;
use crate::document::{dict_get, dict_get_dict, name, number, resolve, stream_data};
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;

/// Fallback ascent/descent (fraction of the font size).
const DEFAULT_ASCENT: f32 = 0.8;
const DEFAULT_DESCENT: f32 = -0.2;

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGlyph {
    /// Character code from the string
    pub code: u32,
    /// Unicode text for the code (may be several chars or empty)
    pub text: String,
    /// Horizontal advance in glyph space (1/1000 em)
    pub width: f32,
    /// Single-byte code 32, which receives word spacing
    pub is_space: bool,
}

/// A loaded font resource.
#[derive(Debug, Clone)]
pub struct PdfFont {
    /// `/BaseFont` name (subset prefix kept)
    pub base_font: String,
    /// Type0 font with two-byte codes
    pub composite: bool,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: HashMap<u32, f32>,
    default_width: f32,
    missing_width: Option<f32>,
    width_scale: f32,
    to_unicode: Option<CMap>,
    differences: HashMap<u32, char>,
    metrics: Option<&'static FontMetrics>,
    /// Ascent as a fraction of the font size
    pub ascent: f32,
    /// Descent as a fraction of the font size (negative)
    pub descent: f32,
}

impl PdfFont {
    /// Helvetica, used when `Tf` names a font the resources do not define.
    pub fn fallback() -> Self {
        let metrics = FontMetrics::helvetica();
        Self {
            base_font: metrics.name.to_string(),
            composite: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: 1000.0,
            missing_width: None,
            width_scale: 1.0,
            to_unicode: None,
            differences: HashMap::new(),
            metrics: Some(metrics),
            ascent: metrics.ascender / 1000.0,
            descent: metrics.descender / 1000.0,
        }
    }

    /// Load a font from its dictionary.
    pub fn load(doc: &Document, dict: &Dictionary) -> Self {
        let subtype = dict_get(doc, dict, b"Subtype").and_then(name).unwrap_or_default();
        let base_font = dict_get(doc, dict, b"BaseFont")
            .and_then(name)
            .unwrap_or_else(|| "Unknown".to_string());
        let composite = subtype == "Type0";
        let metrics = FontMetrics::by_name(&base_font);

        let to_unicode = match dict_get(doc, dict, b"ToUnicode") {
            Some(Object::Stream(stream)) => stream_data(stream).map(|d| parse_tounicode_cmap(&d)),
            _ => None,
        };

        let mut font = Self {
            base_font,
            composite,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: 1000.0,
            missing_width: None,
            width_scale: 1.0,
            to_unicode,
            differences: HashMap::new(),
            metrics,
            ascent: 0.0,
            descent: 0.0,
        };

        let descriptor = if composite {
            let descendant = match dict_get(doc, dict, b"DescendantFonts") {
                Some(Object::Array(items)) => items.first().and_then(|o| resolve(doc, o)),
                _ => None,
            };
            match descendant {
                Some(Object::Dictionary(cid_font)) => {
                    font.load_cid_widths(doc, cid_font);
                    dict_get_dict(doc, cid_font, b"FontDescriptor")
                },
                _ => None,
            }
        } else {
            font.load_simple_widths(doc, dict);
            font.load_differences(doc, dict);
            if subtype == "Type3" {
                if let Some(Object::Array(fm)) = dict_get(doc, dict, b"FontMatrix") {
                    if let Some(sx) = fm.first().and_then(|o| resolve(doc, o)).and_then(number) {
                        font.width_scale = sx * 1000.0;
                    }
                }
            }
            dict_get_dict(doc, dict, b"FontDescriptor")
        };

        if let Some(desc) = descriptor {
            font.missing_width = dict_get(doc, desc, b"MissingWidth").and_then(number);
            let ascent = dict_get(doc, desc, b"Ascent").and_then(number).unwrap_or(0.0);
            let descent = dict_get(doc, desc, b"Descent").and_then(number).unwrap_or(0.0);
            font.ascent = ascent / 1000.0;
            font.descent = -(descent.abs()) / 1000.0;
        }
        if font.ascent <= 0.0 {
            font.ascent = metrics.map_or(DEFAULT_ASCENT, |m| m.ascender / 1000.0);
        }
        if font.descent >= 0.0 {
            font.descent = metrics.map_or(DEFAULT_DESCENT, |m| m.descender / 1000.0);
        }

        log::trace!(
            "Loaded font {} (composite={}, tounicode={})",
            font.base_font,
            font.composite,
            font.to_unicode.is_some()
        );
        font
    }

    fn load_simple_widths(&mut self, doc: &Document, dict: &Dictionary) {
        self.first_char = dict_get(doc, dict, b"FirstChar")
            .and_then(number)
            .map_or(0, |n| n.max(0.0) as u32);
        if let Some(Object::Array(items)) = dict_get(doc, dict, b"Widths") {
            self.widths = items
                .iter()
                .map(|o| resolve(doc, o).and_then(number).unwrap_or(0.0))
                .collect();
        }
    }

    /// Parse the CIDFont `/W` array: `c [w1 w2 ...]` and `c_first c_last w`.
    fn load_cid_widths(&mut self, doc: &Document, cid_font: &Dictionary) {
        if let Some(dw) = dict_get(doc, cid_font, b"DW").and_then(number) {
            self.default_width = dw;
        }
        let Some(Object::Array(items)) = dict_get(doc, cid_font, b"W") else {
            return;
        };
        let items: Vec<&Object> = items.iter().filter_map(|o| resolve(doc, o)).collect();
        let mut i = 0;
        while i < items.len() {
            let Some(first) = number(items[i]) else {
                i += 1;
                continue;
            };
            let first = first as u32;
            match items.get(i + 1) {
                Some(Object::Array(ws)) => {
                    for (k, w) in ws.iter().enumerate() {
                        if let Some(w) = resolve(doc, w).and_then(number) {
                            self.cid_widths.insert(first + k as u32, w);
                        }
                    }
                    i += 2;
                },
                Some(last) => {
                    let (Some(last), Some(w)) =
                        (number(last), items.get(i + 2).and_then(|o| number(o)))
                    else {
                        break;
                    };
                    for cid in first..=(last as u32).min(first + 0xFFFF) {
                        self.cid_widths.insert(cid, w);
                    }
                    i += 3;
                },
                None => break,
            }
        }
    }

    fn load_differences(&mut self, doc: &Document, dict: &Dictionary) {
        let Some(Object::Dictionary(enc)) = dict_get(doc, dict, b"Encoding") else {
            return;
        };
        let Some(Object::Array(diffs)) = dict_get(doc, enc, b"Differences") else {
            return;
        };
        let mut code = 0u32;
        for item in diffs {
            match resolve(doc, item) {
                Some(Object::Integer(n)) => code = (*n).max(0) as u32,
                Some(Object::Name(glyph)) => {
                    if let Some(ch) = glyph_name_to_unicode(&String::from_utf8_lossy(glyph)) {
                        self.differences.insert(code, ch);
                    }
                    code += 1;
                },
                _ => {},
            }
        }
    }

    /// Split a shown string into character codes and decode each one.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedGlyph> {
        if self.composite {
            bytes
                .chunks(2)
                .map(|pair| {
                    let code = pair.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
                    let text = self
                        .to_unicode
                        .as_ref()
                        .and_then(|m| m.get(&code).cloned())
                        .unwrap_or_else(|| '\u{FFFD}'.to_string());
                    let width = *self.cid_widths.get(&code).unwrap_or(&self.default_width);
                    DecodedGlyph {
                        code,
                        text,
                        width,
                        is_space: false,
                    }
                })
                .collect()
        } else {
            bytes
                .iter()
                .map(|&b| {
                    let code = b as u32;
                    let text = self.simple_text(code);
                    let width = self.simple_width(code, &text);
                    DecodedGlyph {
                        code,
                        text,
                        width,
                        is_space: b == b' ',
                    }
                })
                .collect()
        }
    }

    fn simple_text(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.get(&code)) {
            return text.clone();
        }
        if let Some(ch) = self.differences.get(&code) {
            return ch.to_string();
        }
        winansi_to_unicode(code as u8).to_string()
    }

    fn simple_width(&self, code: u32, text: &str) -> f32 {
        if let Some(idx) = code.checked_sub(self.first_char) {
            if let Some(w) = self.widths.get(idx as usize) {
                return w * self.width_scale;
            }
        }
        if let Some(w) = self.missing_width.filter(|w| *w > 0.0) {
            return w;
        }
        match (self.metrics, text.chars().next()) {
            (Some(m), Some(ch)) => m.char_width(ch),
            _ => 500.0,
        }
    }
}
