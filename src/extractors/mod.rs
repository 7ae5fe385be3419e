//! Extraction of text blocks and image regions from interpreted pages.

pub mod regions;
pub mod text;

pub use regions::{find_image_regions, ImageRegion, RegionKind};
pub use text::{extract_blocks, extract_blocks_with_config, TextExtractionConfig};
