//! PDF content stream operators.
//!
//! Typed view over the raw `lopdf` operations. Operators that do not affect
//! text geometry, painted regions or the raster are kept as
//! [`Operator::Other`].

use crate::document::{name as name_of, number as num};
use lopdf::content::Operation;
use lopdf::Object;

/// A content stream operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    // Text positioning operators
    /// Move text position (Td)
    Td {
        /// Horizontal offset
        tx: f32,
        /// Vertical offset
        ty: f32,
    },
    /// Move text position and set leading (TD)
    TD {
        /// Horizontal offset
        tx: f32,
        /// Vertical offset
        ty: f32,
    },
    /// Set text matrix (Tm)
    Tm {
        /// Matrix components `[a b c d e f]`
        matrix: [f32; 6],
    },
    /// Move to start of next line (T*)
    TStar,

    // Text showing operators
    /// Show text string (Tj)
    Tj {
        /// Text to show (byte array)
        text: Vec<u8>,
    },
    /// Show text with individual glyph positioning (TJ)
    TJ {
        /// Array of text strings and positioning adjustments
        array: Vec<TextElement>,
    },
    /// Move to next line and show text (')
    Quote {
        /// Text to show
        text: Vec<u8>,
    },
    /// Set spacing, move to next line and show text (")
    DoubleQuote {
        /// Word spacing
        word_space: f32,
        /// Character spacing
        char_space: f32,
        /// Text to show
        text: Vec<u8>,
    },

    // Text state operators
    /// Set character spacing (Tc)
    Tc {
        /// Character spacing
        char_space: f32,
    },
    /// Set word spacing (Tw)
    Tw {
        /// Word spacing
        word_space: f32,
    },
    /// Set horizontal scaling (Tz)
    Tz {
        /// Horizontal scaling percentage
        scale: f32,
    },
    /// Set text leading (TL)
    TL {
        /// Text leading
        leading: f32,
    },
    /// Set font and size (Tf)
    Tf {
        /// Font resource name
        font: String,
        /// Font size
        size: f32,
    },
    /// Set text rendering mode (Tr)
    Tr {
        /// Rendering mode
        render: u8,
    },
    /// Set text rise (Ts)
    Ts {
        /// Text rise
        rise: f32,
    },
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,

    // Graphics state operators
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Modify current transformation matrix (cm)
    Cm {
        /// Matrix components `[a b c d e f]`
        matrix: [f32; 6],
    },
    /// Set line width (w)
    SetLineWidth {
        /// Line width
        width: f32,
    },
    /// Set dash pattern (d)
    SetDash {
        /// Dash lengths
        array: Vec<f32>,
        /// Dash phase
        phase: f32,
    },
    /// Set line cap (J)
    SetLineCap {
        /// Cap style
        cap_style: u8,
    },
    /// Set line join (j)
    SetLineJoin {
        /// Join style
        join_style: u8,
    },
    /// Set miter limit (M)
    SetMiterLimit {
        /// Miter limit
        limit: f32,
    },
    /// Apply a named ExtGState (gs)
    SetExtGState {
        /// Resource name
        dict_name: String,
    },

    // Color operators
    /// Set RGB fill color (rg)
    SetFillRgb {
        /// Components
        rgb: [f32; 3],
    },
    /// Set RGB stroke color (RG)
    SetStrokeRgb {
        /// Components
        rgb: [f32; 3],
    },
    /// Set gray fill color (g)
    SetFillGray {
        /// Gray level
        gray: f32,
    },
    /// Set gray stroke color (G)
    SetStrokeGray {
        /// Gray level
        gray: f32,
    },
    /// Set CMYK fill color (k)
    SetFillCmyk {
        /// Components
        cmyk: [f32; 4],
    },
    /// Set CMYK stroke color (K)
    SetStrokeCmyk {
        /// Components
        cmyk: [f32; 4],
    },
    /// Set fill color space (cs)
    SetFillColorSpace {
        /// Color space name
        name: String,
    },
    /// Set stroke color space (CS)
    SetStrokeColorSpace {
        /// Color space name
        name: String,
    },
    /// Set fill color (sc/scn)
    SetFillColor {
        /// Numeric components
        components: Vec<f32>,
        /// Pattern name, for pattern spaces
        pattern: Option<String>,
    },
    /// Set stroke color (SC/SCN)
    SetStrokeColor {
        /// Numeric components
        components: Vec<f32>,
        /// Pattern name, for pattern spaces
        pattern: Option<String>,
    },

    // XObject operators
    /// Paint an XObject (Do)
    Do {
        /// Resource name
        name: String,
    },

    // Path construction
    /// Begin subpath (m)
    MoveTo {
        /// X coordinate
        x: f32,
        /// Y coordinate
        y: f32,
    },
    /// Append line (l)
    LineTo {
        /// X coordinate
        x: f32,
        /// Y coordinate
        y: f32,
    },
    /// Append cubic Bézier curve (c, v, y)
    ///
    /// `v` and `y` are normalized into this form by the interpreter, which
    /// knows the current point.
    CurveTo {
        /// First control point, `None` for `v` (current point)
        c1: Option<(f32, f32)>,
        /// Second control point, `None` for `y` (end point)
        c2: Option<(f32, f32)>,
        /// End point
        end: (f32, f32),
    },
    /// Close subpath (h)
    ClosePath,
    /// Append rectangle (re)
    Rectangle {
        /// Lower-left x
        x: f32,
        /// Lower-left y
        y: f32,
        /// Width
        width: f32,
        /// Height
        height: f32,
    },

    // Path painting
    /// Paint the current path
    Paint {
        /// Close the subpath first (s, b, b*)
        close: bool,
        /// Fill with the given rule
        fill: Option<FillRule>,
        /// Stroke the path
        stroke: bool,
    },
    /// End path without painting (n)
    EndPath,
    /// Set clipping path (W, W*)
    Clip,

    /// Any operator not listed above
    Other {
        /// Operator name
        name: String,
    },
}

/// Fill rule of a painting operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    /// Nonzero winding number
    NonZero,
    /// Even-odd
    EvenOdd,
}

/// Element of a `TJ` array.
#[derive(Debug, Clone, PartialEq)]
pub enum TextElement {
    /// Shown string
    String(Vec<u8>),
    /// Position adjustment in thousandths of text space
    Offset(f32),
}

fn bytes_of(obj: &Object) -> Option<Vec<u8>> {
    match obj {
        Object::String(bytes, _) => Some(bytes.clone()),
        _ => None,
    }
}

fn nums<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(&operands[operands.len() - N..]) {
        *slot = num(obj)?;
    }
    Some(out)
}

impl Operator {
    /// Convert a raw operation into a typed operator.
    ///
    /// Returns `None` when the operands are malformed; the caller skips
    /// such operators like a conforming reader would.
    ///
    /// # Examples
    ///
    /// ```
    /// use lopdf::content::Operation;
    /// use pdf_retext::content::Operator;
    ///
    /// let op = Operation::new("Td", vec![10.into(), 20.into()]);
    /// assert_eq!(Operator::from_operation(&op), Some(Operator::Td { tx: 10.0, ty: 20.0 }));
    /// ```
    pub fn from_operation(op: &Operation) -> Option<Operator> {
        let ops = op.operands.as_slice();
        let parsed = match op.operator.as_str() {
            "Td" => {
                let [tx, ty] = nums::<2>(ops)?;
                Operator::Td { tx, ty }
            },
            "TD" => {
                let [tx, ty] = nums::<2>(ops)?;
                Operator::TD { tx, ty }
            },
            "Tm" => Operator::Tm { matrix: nums(ops)? },
            "T*" => Operator::TStar,
            "Tj" => Operator::Tj {
                text: bytes_of(ops.first()?)?,
            },
            "TJ" => {
                let Object::Array(items) = ops.first()? else {
                    return None;
                };
                let array = items
                    .iter()
                    .filter_map(|item| match item {
                        Object::String(bytes, _) => Some(TextElement::String(bytes.clone())),
                        other => num(other).map(TextElement::Offset),
                    })
                    .collect();
                Operator::TJ { array }
            },
            "'" => Operator::Quote {
                text: bytes_of(ops.last()?)?,
            },
            "\"" => {
                if ops.len() < 3 {
                    return None;
                }
                Operator::DoubleQuote {
                    word_space: num(&ops[0])?,
                    char_space: num(&ops[1])?,
                    text: bytes_of(&ops[2])?,
                }
            },
            "Tc" => Operator::Tc {
                char_space: num(ops.first()?)?,
            },
            "Tw" => Operator::Tw {
                word_space: num(ops.first()?)?,
            },
            "Tz" => Operator::Tz {
                scale: num(ops.first()?)?,
            },
            "TL" => Operator::TL {
                leading: num(ops.first()?)?,
            },
            "Tf" => {
                if ops.len() < 2 {
                    return None;
                }
                Operator::Tf {
                    font: name_of(&ops[0])?,
                    size: num(&ops[1])?,
                }
            },
            "Tr" => Operator::Tr {
                render: num(ops.first()?)?.clamp(0.0, 7.0) as u8,
            },
            "Ts" => Operator::Ts {
                rise: num(ops.first()?)?,
            },
            "BT" => Operator::BeginText,
            "ET" => Operator::EndText,
            "q" => Operator::SaveState,
            "Q" => Operator::RestoreState,
            "cm" => Operator::Cm { matrix: nums(ops)? },
            "w" => Operator::SetLineWidth {
                width: num(ops.first()?)?,
            },
            "d" => {
                let Object::Array(items) = ops.first()? else {
                    return None;
                };
                Operator::SetDash {
                    array: items.iter().filter_map(num).collect(),
                    phase: ops.get(1).and_then(num).unwrap_or(0.0),
                }
            },
            "J" => Operator::SetLineCap {
                cap_style: num(ops.first()?)?.clamp(0.0, 2.0) as u8,
            },
            "j" => Operator::SetLineJoin {
                join_style: num(ops.first()?)?.clamp(0.0, 2.0) as u8,
            },
            "M" => Operator::SetMiterLimit {
                limit: num(ops.first()?)?,
            },
            "gs" => Operator::SetExtGState {
                dict_name: name_of(ops.first()?)?,
            },
            "rg" => Operator::SetFillRgb { rgb: nums(ops)? },
            "RG" => Operator::SetStrokeRgb { rgb: nums(ops)? },
            "g" => Operator::SetFillGray {
                gray: num(ops.first()?)?,
            },
            "G" => Operator::SetStrokeGray {
                gray: num(ops.first()?)?,
            },
            "k" => Operator::SetFillCmyk { cmyk: nums(ops)? },
            "K" => Operator::SetStrokeCmyk { cmyk: nums(ops)? },
            "cs" => Operator::SetFillColorSpace {
                name: name_of(ops.first()?)?,
            },
            "CS" => Operator::SetStrokeColorSpace {
                name: name_of(ops.first()?)?,
            },
            "sc" | "scn" => Operator::SetFillColor {
                components: ops.iter().filter_map(num).collect(),
                pattern: ops.last().and_then(name_of),
            },
            "SC" | "SCN" => Operator::SetStrokeColor {
                components: ops.iter().filter_map(num).collect(),
                pattern: ops.last().and_then(name_of),
            },
            "Do" => Operator::Do {
                name: name_of(ops.first()?)?,
            },
            "m" => {
                let [x, y] = nums::<2>(ops)?;
                Operator::MoveTo { x, y }
            },
            "l" => {
                let [x, y] = nums::<2>(ops)?;
                Operator::LineTo { x, y }
            },
            "c" => {
                let [x1, y1, x2, y2, x3, y3] = nums::<6>(ops)?;
                Operator::CurveTo {
                    c1: Some((x1, y1)),
                    c2: Some((x2, y2)),
                    end: (x3, y3),
                }
            },
            "v" => {
                let [x2, y2, x3, y3] = nums::<4>(ops)?;
                Operator::CurveTo {
                    c1: None,
                    c2: Some((x2, y2)),
                    end: (x3, y3),
                }
            },
            "y" => {
                let [x1, y1, x3, y3] = nums::<4>(ops)?;
                Operator::CurveTo {
                    c1: Some((x1, y1)),
                    c2: None,
                    end: (x3, y3),
                }
            },
            "h" => Operator::ClosePath,
            "re" => {
                let [x, y, width, height] = nums::<4>(ops)?;
                Operator::Rectangle {
                    x,
                    y,
                    width,
                    height,
                }
            },
            "S" => paint(false, None, true),
            "s" => paint(true, None, true),
            "f" | "F" => paint(false, Some(FillRule::NonZero), false),
            "f*" => paint(false, Some(FillRule::EvenOdd), false),
            "B" => paint(false, Some(FillRule::NonZero), true),
            "B*" => paint(false, Some(FillRule::EvenOdd), true),
            "b" => paint(true, Some(FillRule::NonZero), true),
            "b*" => paint(true, Some(FillRule::EvenOdd), true),
            "n" => Operator::EndPath,
            "W" | "W*" => Operator::Clip,
            other => Operator::Other {
                name: other.to_string(),
            },
        };
        Some(parsed)
    }
}

fn paint(close: bool, fill: Option<FillRule>, stroke: bool) -> Operator {
    Operator::Paint {
        close,
        fill,
        stroke,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::StringFormat;

    #[test]
    fn test_tj_array_mixes_strings_and_offsets() {
        let op = Operation::new(
            "TJ",
            vec![Object::Array(vec![
                Object::String(b"He".to_vec(), StringFormat::Literal),
                Object::Integer(-120),
                Object::String(b"llo".to_vec(), StringFormat::Literal),
            ])],
        );
        let Some(Operator::TJ { array }) = Operator::from_operation(&op) else {
            panic!("expected TJ");
        };
        assert_eq!(array.len(), 3);
        assert_eq!(array[1], TextElement::Offset(-120.0));
    }

    #[test]
    fn test_tf_and_real_operands() {
        let op = Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Real(11.5)]);
        assert_eq!(
            Operator::from_operation(&op),
            Some(Operator::Tf {
                font: "F1".to_string(),
                size: 11.5
            })
        );
    }

    #[test]
    fn test_malformed_operands_are_rejected() {
        let op = Operation::new("cm", vec![1.into(), 0.into()]);
        assert_eq!(Operator::from_operation(&op), None);
        let op = Operation::new("Tj", vec![]);
        assert_eq!(Operator::from_operation(&op), None);
    }

    #[test]
    fn test_painting_operators() {
        let op = Operation::new("b*", vec![]);
        assert_eq!(
            Operator::from_operation(&op),
            Some(Operator::Paint {
                close: true,
                fill: Some(FillRule::EvenOdd),
                stroke: true
            })
        );
        let op = Operation::new("scn", vec![Object::Name(b"P0".to_vec())]);
        assert_eq!(
            Operator::from_operation(&op),
            Some(Operator::SetFillColor {
                components: vec![],
                pattern: Some("P0".to_string())
            })
        );
    }
}
