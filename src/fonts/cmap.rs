//! ToUnicode CMap parser.
//!
//! Only the `bfchar` and `bfrange` sections matter for text extraction;
//! codespace ranges are ignored and code length is decided by the font kind.

use regex::Regex;
use std::collections::HashMap;

/// Character code to Unicode string.
pub type CMap = HashMap<u32, String>;

/// Upper bound on codes expanded from a single sequential bfrange.
const MAX_RANGE_LEN: u32 = 0xFFFF;

/// Parse a ToUnicode CMap stream into a code map.
///
/// # Examples
///
/// ```
/// use pdf_retext::fonts::cmap::parse_tounicode_cmap;
///
/// let data = b"beginbfchar\n<0041> <0061>\nendbfchar\nbeginbfrange\n<0030> <0032> <0031>\nendbfrange";
/// let cmap = parse_tounicode_cmap(data);
/// assert_eq!(cmap.get(&0x41).map(String::as_str), Some("a"));
/// assert_eq!(cmap.get(&0x32).map(String::as_str), Some("3"));
/// ```
pub fn parse_tounicode_cmap(data: &[u8]) -> CMap {
    let mut cmap = HashMap::new();
    let content = String::from_utf8_lossy(data);

    for section in extract_sections(&content, "beginbfchar", "endbfchar") {
        for caps in BFCHAR.captures_iter(section) {
            let Ok(src) = u32::from_str_radix(&caps[1], 16) else {
                continue;
            };
            if let Some(dst) = decode_utf16_hex(&caps[2]) {
                cmap.insert(src, dst);
            }
        }
    }

    for section in extract_sections(&content, "beginbfrange", "endbfrange") {
        for line in section.lines() {
            for (src, dst) in parse_bfrange_line(line) {
                cmap.insert(src, dst);
            }
        }
    }

    log::trace!("ToUnicode CMap: {} mappings", cmap.len());
    cmap
}

lazy_static::lazy_static! {
    static ref BFCHAR: Regex = Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]*)>").unwrap();
    static ref BFRANGE_SEQ: Regex =
        Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>").unwrap();
    static ref BFRANGE_ARRAY: Regex =
        Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*\[([^\]]*)\]").unwrap();
    static ref HEX_STRING: Regex = Regex::new(r"<([0-9A-Fa-f]+)>").unwrap();
}

/// Extract sections between begin and end markers.
fn extract_sections<'a>(content: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut sections = Vec::new();
    let mut remaining = content;

    while let Some(begin_pos) = remaining.find(begin) {
        let after_begin = &remaining[begin_pos + begin.len()..];
        let Some(end_pos) = after_begin.find(end) else {
            break;
        };
        sections.push(&after_begin[..end_pos]);
        remaining = &after_begin[end_pos + end.len()..];
    }

    sections
}

/// Parse one bfrange entry in either sequential or array form.
fn parse_bfrange_line(line: &str) -> Vec<(u32, String)> {
    if let Some(caps) = BFRANGE_ARRAY.captures(line) {
        let (Ok(start), Ok(end)) = (
            u32::from_str_radix(&caps[1], 16),
            u32::from_str_radix(&caps[2], 16),
        ) else {
            return Vec::new();
        };
        return HEX_STRING
            .captures_iter(&caps[3])
            .take(end.saturating_sub(start) as usize + 1)
            .enumerate()
            .filter_map(|(i, c)| Some((start + i as u32, decode_utf16_hex(&c[1])?)))
            .collect();
    }

    let Some(caps) = BFRANGE_SEQ.captures(line) else {
        return Vec::new();
    };
    let (Ok(start), Ok(end)) = (
        u32::from_str_radix(&caps[1], 16),
        u32::from_str_radix(&caps[2], 16),
    ) else {
        return Vec::new();
    };
    let dst_hex = &caps[3];
    let Some(mut units) = hex_to_utf16_units(dst_hex) else {
        return Vec::new();
    };

    let count = end.saturating_sub(start).min(MAX_RANGE_LEN);
    let mut result = Vec::with_capacity(count as usize + 1);
    for i in 0..=count {
        // Sequential ranges increment the last code unit of the destination.
        if i > 0 {
            if let Some(last) = units.last_mut() {
                *last = last.wrapping_add(1);
            }
        }
        let text = String::from_utf16_lossy(&units);
        result.push((start + i, text));
    }
    result
}

/// Decode a hex destination string as UTF-16BE (handles surrogate pairs and
/// multi-character ligature mappings).
fn decode_utf16_hex(hex: &str) -> Option<String> {
    let units = hex_to_utf16_units(hex)?;
    if units.is_empty() {
        return None;
    }
    Some(String::from_utf16_lossy(&units))
}

fn hex_to_utf16_units(hex: &str) -> Option<Vec<u16>> {
    if hex.len() <= 2 {
        // One-byte destination, seen in some producer output.
        return u16::from_str_radix(hex, 16).ok().map(|u| vec![u]);
    }
    let padded;
    let hex = if hex.len() % 4 != 0 {
        padded = format!("{:0>width$}", hex, width = hex.len().div_ceil(4) * 4);
        padded.as_str()
    } else {
        hex
    };
    (0..hex.len())
        .step_by(4)
        .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bfchar_basic() {
        let cmap = parse_tounicode_cmap(b"2 beginbfchar\n<03> <0041>\n<04> <00420043>\nendbfchar");
        assert_eq!(cmap.get(&3).map(String::as_str), Some("A"));
        assert_eq!(cmap.get(&4).map(String::as_str), Some("BC"));
    }

    #[test]
    fn test_bfchar_surrogate_pair() {
        let cmap = parse_tounicode_cmap(b"beginbfchar\n<0001> <D835DF0C>\nendbfchar");
        assert_eq!(cmap.get(&1).map(String::as_str), Some("\u{1D70C}"));
    }

    #[test]
    fn test_bfrange_sequential() {
        let cmap = parse_tounicode_cmap(b"beginbfrange\n<0020> <0022> <0041>\nendbfrange");
        assert_eq!(cmap.len(), 3);
        assert_eq!(cmap.get(&0x21).map(String::as_str), Some("B"));
        assert_eq!(cmap.get(&0x22).map(String::as_str), Some("C"));
    }

    #[test]
    fn test_bfrange_array() {
        let cmap = parse_tounicode_cmap(
            b"beginbfrange\n<005F> <0061> [<00660066> <00660069> <0066006C>]\nendbfrange",
        );
        assert_eq!(cmap.get(&0x5F).map(String::as_str), Some("ff"));
        assert_eq!(cmap.get(&0x60).map(String::as_str), Some("fi"));
        assert_eq!(cmap.get(&0x61).map(String::as_str), Some("fl"));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_tounicode_cmap(b"").is_empty());
    }
}
