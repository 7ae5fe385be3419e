//! Extracted document tree.

use super::text_block::{BlockId, TextBlock};
use crate::background::Background;

/// One page of the extracted tree.
///
/// Coordinates of everything on the page are in points with a top-left
/// origin relative to the MediaBox.
#[derive(Debug, Clone)]
pub struct Page {
    /// Zero-based page index
    pub index: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Page rotation in degrees
    pub rotation: i64,
    /// Text blocks in reading order
    pub blocks: Vec<TextBlock>,
    /// Original page with non-image text erased, once synthesized
    pub background: Option<Background>,
}

impl Page {
    /// Blocks that are erased and replaced (not inside an image).
    pub fn replaceable_blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.blocks.iter().filter(|b| !b.is_in_image)
    }
}

/// The extracted document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Pages in order
    pub pages: Vec<Page>,
}

impl Document {
    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All blocks in page order.
    pub fn blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }

    /// Look up a block by id.
    pub fn block(&self, id: BlockId) -> Option<&TextBlock> {
        self.pages
            .get(id.page_index)
            .and_then(|p| p.blocks.get(id.block_index))
    }
}
