//! Single-byte text encodings.
//!
//! Decoding covers WinAnsi (the encoding of nearly every simple font without
//! a ToUnicode map) and `/Differences` glyph names. Encoding is used when
//! writing replacement text with the standard 14 fonts.

/// WinAnsi (Windows-1252) bytes 0x80-0x9F, which differ from Latin-1.
const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'), // Euro sign
    (0x82, '\u{201A}'), // Single low-9 quotation mark
    (0x83, '\u{0192}'), // Latin small letter f with hook
    (0x84, '\u{201E}'), // Double low-9 quotation mark
    (0x85, '\u{2026}'), // Horizontal ellipsis
    (0x86, '\u{2020}'), // Dagger
    (0x87, '\u{2021}'), // Double dagger
    (0x88, '\u{02C6}'), // Modifier letter circumflex accent
    (0x89, '\u{2030}'), // Per mille sign
    (0x8A, '\u{0160}'), // Latin capital letter S with caron
    (0x8B, '\u{2039}'), // Single left-pointing angle quotation mark
    (0x8C, '\u{0152}'), // Latin capital ligature OE
    (0x8E, '\u{017D}'), // Latin capital letter Z with caron
    (0x91, '\u{2018}'), // Left single quotation mark
    (0x92, '\u{2019}'), // Right single quotation mark
    (0x93, '\u{201C}'), // Left double quotation mark
    (0x94, '\u{201D}'), // Right double quotation mark
    (0x95, '\u{2022}'), // Bullet
    (0x96, '\u{2013}'), // En dash
    (0x97, '\u{2014}'), // Em dash
    (0x98, '\u{02DC}'), // Small tilde
    (0x99, '\u{2122}'), // Trade mark sign
    (0x9A, '\u{0161}'), // Latin small letter s with caron
    (0x9B, '\u{203A}'), // Single right-pointing angle quotation mark
    (0x9C, '\u{0153}'), // Latin small ligature oe
    (0x9E, '\u{017E}'), // Latin small letter z with caron
    (0x9F, '\u{0178}'), // Latin capital letter Y with diaeresis
];

/// Map a Unicode code point to its WinAnsi byte, if it has one.
pub fn unicode_to_winansi(codepoint: u32) -> Option<u8> {
    if codepoint < 0x80 || (0xA0..=0xFF).contains(&codepoint) {
        return Some(codepoint as u8);
    }
    WINANSI_HIGH
        .iter()
        .find(|(_, ch)| *ch as u32 == codepoint)
        .map(|(byte, _)| *byte)
}

/// Map a WinAnsi byte to its character.
///
/// Undefined bytes in 0x80-0x9F fall back to their Latin-1 value.
pub fn winansi_to_unicode(byte: u8) -> char {
    if (0x80..=0x9F).contains(&byte) {
        if let Some((_, ch)) = WINANSI_HIGH.iter().find(|(b, _)| *b == byte) {
            return *ch;
        }
    }
    byte as char
}

/// Encode text for a simple font using WinAnsiEncoding.
///
/// Characters outside the encoding are replaced with `?`.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| unicode_to_winansi(ch as u32).unwrap_or(b'?'))
        .collect()
}

/// Resolve an Adobe glyph name from a `/Differences` array.
///
/// Covers the names that show up in practice for Latin text plus the
/// `uniXXXX` / `uXXXX[XX]` conventions.
pub fn glyph_name_to_unicode(name: &str) -> Option<char> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return Some(ch);
    }
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() >= 4 {
            return u32::from_str_radix(&hex[..4], 16).ok().and_then(char::from_u32);
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            if let Ok(cp) = u32::from_str_radix(hex, 16) {
                return char::from_u32(cp);
            }
        }
    }
    let ch = match name {
        "space" | "nbspace" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "minus" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "underscore" => '_',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "bullet" => '\u{2022}',
        "ellipsis" => '\u{2026}',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        "degree" => '\u{00B0}',
        "copyright" => '\u{00A9}',
        "registered" => '\u{00AE}',
        _ => return None,
    };
    Some(ch)
}

/// Escape raw bytes for a PDF literal string (without the parentheses).
pub fn escape_literal_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 8);
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            },
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x20..=0x7E => out.push(b),
            _ => out.extend_from_slice(format!("\\{:03o}", b).as_bytes()),
        }
    }
    out
}
