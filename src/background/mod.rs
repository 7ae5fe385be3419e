//! Background synthesis.
//!
//! The original page is rasterized and the text of every block outside an
//! image is painted over with a color sampled from just outside the block.
//! The result replaces the page content, so images, vector art and fills
//! survive while the old text disappears.

mod synthesizer;

pub use synthesizer::{probe_points, sample_color, synthesize, Background};
