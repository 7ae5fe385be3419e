//! CCITTFaxDecode (Group 3 and Group 4) for bilevel images.
//!
//! Output is packed one bit per pixel, MSB first, rows byte aligned. A black
//! pixel is written as `1` when `/BlackIs1` is true and as `0` otherwise, so
//! the samples can be read like any other 1-bit DeviceGray image.

use crate::document::{dict_get, number};
use lopdf::{Document, Object};

/// Parameters from a `/DecodeParms` dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct CcittParams {
    /// `/K`: negative for Group 4, zero or positive for Group 3
    pub k: i32,
    /// `/Columns`
    pub columns: u32,
    /// `/Rows`, when present
    pub rows: Option<u32>,
    /// `/BlackIs1`
    pub black_is_1: bool,
}

impl CcittParams {
    /// Read the parameters, falling back to the image dimensions.
    pub fn from_parms(doc: &Document, parms: Option<&Object>, width: u32, height: u32) -> Self {
        let dict = match parms {
            Some(Object::Dictionary(d)) => Some(d),
            Some(Object::Array(items)) => items.iter().rev().find_map(|o| match o {
                Object::Dictionary(d) => Some(d),
                _ => None,
            }),
            _ => None,
        };
        let num = |key: &[u8]| dict.and_then(|d| dict_get(doc, d, key)).and_then(number);
        Self {
            k: num(b"K").unwrap_or(0.0) as i32,
            columns: num(b"Columns").map(|c| c as u32).filter(|c| *c > 0).unwrap_or(width),
            rows: num(b"Rows").map(|r| r as u32).filter(|r| *r > 0).or(Some(height)),
            black_is_1: matches!(
                dict.and_then(|d| dict_get(doc, d, b"BlackIs1")),
                Some(Object::Boolean(true))
            ),
        }
    }

    fn is_group_4(&self) -> bool {
        self.k < 0
    }
}

/// Decode CCITT data to packed 1-bit rows.
///
/// Streams the fax decoder rejects come back as an all-white image.
pub fn decode_ccitt(data: &[u8], params: &CcittParams) -> Vec<u8> {
    let width = params.columns as usize;
    let row_bytes = width.div_ceil(8);
    let rows = params.rows.unwrap_or(1) as usize;

    let black_rows = try_decode(data, params).or_else(|| {
        // some producers pad the stream with leading zero bytes
        let trimmed: Vec<u8> = data.iter().skip_while(|b| **b == 0).copied().collect();
        if trimmed.len() < data.len() && !trimmed.is_empty() {
            log::debug!("Retrying CCITT decode without {} leading zero bytes", data.len() - trimmed.len());
            try_decode(&trimmed, params)
        } else {
            None
        }
    });

    let mut output = match black_rows {
        Some(rows) => rows,
        None => {
            log::warn!(
                "CCITT decode failed ({}x{}, K={}), using a blank image",
                params.columns,
                rows,
                params.k
            );
            Vec::new()
        },
    };
    // short output is padded with white rows
    output.resize(rows * row_bytes, 0);

    // black is 1 after decoding; flip when black should read as 0
    if !params.black_is_1 {
        for byte in &mut output {
            *byte = !*byte;
        }
    }
    output
}

fn try_decode(data: &[u8], params: &CcittParams) -> Option<Vec<u8>> {
    use fax::decoder;

    let width = params.columns as usize;
    let height = params.rows.map(|r| r.min(u16::MAX as u32) as u16);
    let mut output = Vec::new();
    let mut produced = 0usize;
    let mut on_line = |transitions: &[u16]| {
        output.extend(transitions_to_bits(transitions, width));
        produced += 1;
    };

    let done = if params.is_group_4() {
        decoder::decode_g4(data.iter().copied(), width.min(u16::MAX as usize) as u16, height, &mut on_line)
    } else {
        decoder::decode_g3(data.iter().copied(), &mut on_line)
    };

    match (done, produced) {
        (Some(()), n) if n > 0 => Some(output),
        _ => None,
    }
}

/// Pack one row given its color transitions, starting white; black bits are set.
fn transitions_to_bits(transitions: &[u16], width: usize) -> Vec<u8> {
    let mut row = vec![0u8; width.div_ceil(8)];
    let mut black = false;
    let mut start = 0usize;
    for pos in transitions.iter().map(|p| *p as usize).chain(std::iter::once(width)) {
        let end = pos.min(width);
        if black {
            for pixel in start..end {
                row[pixel / 8] |= 1 << (7 - pixel % 8);
            }
        }
        black = !black;
        start = end.max(start);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn params(k: i32, columns: u32, rows: u32, black_is_1: bool) -> CcittParams {
        CcittParams {
            k,
            columns,
            rows: Some(rows),
            black_is_1,
        }
    }

    #[test]
    fn test_transitions_set_black_runs() {
        // white 0..3, black 3..5, white 5..8
        assert_eq!(transitions_to_bits(&[3, 5], 8), vec![0b0001_1000]);
        // black to the end of the row
        assert_eq!(transitions_to_bits(&[6], 10), vec![0b0000_0011, 0b1100_0000]);
        assert_eq!(transitions_to_bits(&[], 8), vec![0]);
    }

    #[test]
    fn test_group4_white_rows() {
        // two V0 codes followed by EOFB
        let data = [0b1100_0000, 0b0000_0100, 0b0000_0000, 0b0100_0000];
        let rows = decode_ccitt(&data, &params(-1, 8, 2, false));
        assert_eq!(rows, vec![0xFF, 0xFF]);
    }

    #[test]
    fn test_undecodable_stream_is_white() {
        assert_eq!(decode_ccitt(&[], &params(-1, 16, 3, false)), vec![0xFF; 6]);
        assert_eq!(decode_ccitt(&[], &params(-1, 16, 3, true)), vec![0x00; 6]);
    }

    #[test]
    fn test_params_fall_back_to_image_size() {
        let doc = Document::with_version("1.5");
        let parms = Object::Dictionary(dictionary! { "K" => -1, "BlackIs1" => true });
        let p = CcittParams::from_parms(&doc, Some(&parms), 40, 20);
        assert_eq!(p, params(-1, 40, 20, true));

        let p = CcittParams::from_parms(&doc, None, 40, 20);
        assert_eq!(p, params(0, 40, 20, false));
    }
}
