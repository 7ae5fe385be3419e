//! Font handling and encoding.
//!
//! Decoding of shown strings for extraction (ToUnicode CMaps, `/Differences`,
//! WinAnsi) and standard-14 metrics for laying out replacement text.

pub mod cmap;
pub mod encoding;
mod font;
pub mod metrics;

pub use cmap::{parse_tounicode_cmap, CMap};
pub use font::{DecodedGlyph, PdfFont};
pub use metrics::{wrap_text, FontFamily, FontMetrics, FontWeight};
