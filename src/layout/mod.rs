//! Extracted layout model and the heuristics that classify it.
//!
//! - [`TextBlock`], [`Line`] and [`Span`]: the per-page text hierarchy
//! - [`region_classifier`]: flags blocks that sit inside images
//! - [`font_mapper`]: canonical font and alignment for re-insertion

pub mod font_mapper;
mod page;
pub mod region_classifier;
pub mod text_block;

pub use font_mapper::{
    alignment_from_line_starts, detect_alignment, map_font, Alignment, CanonicalFamily,
    MappedFont,
};
pub use page::{Document, Page};
pub use region_classifier::{classify_blocks, is_in_image, overlap_ratio};
pub use text_block::{pack_rgb, unpack_rgb, BlockId, Line, Span, TextBlock};
