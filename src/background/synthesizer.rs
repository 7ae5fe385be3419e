use crate::config::BackgroundConfig;
use crate::geometry::{Point, Rect};
use crate::layout::text_block::most_frequent;
use crate::layout::{BlockId, TextBlock};
use crate::rendering::Raster;

/// A page raster with non-image text erased.
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    /// The edited raster
    pub raster: Raster,
    /// Fill color chosen for each erased block
    pub fills: Vec<(BlockId, [u8; 3])>,
}

impl Background {
    /// An untouched raster (nothing erased).
    pub fn untouched(raster: Raster) -> Self {
        Self {
            raster,
            fills: Vec::new(),
        }
    }

    /// Number of erased blocks.
    pub fn erased_count(&self) -> usize {
        self.fills.len()
    }
}

/// Probe centers just outside the four corners of `bbox`.
pub fn probe_points(bbox: &Rect, offset: f32) -> [Point; 4] {
    [
        Point::new(bbox.x0 - offset, bbox.y0 - offset),
        Point::new(bbox.x1 + offset, bbox.y0 - offset),
        Point::new(bbox.x0 - offset, bbox.y1 + offset),
        Point::new(bbox.x1 + offset, bbox.y1 + offset),
    ]
}

/// Sample the surrounding color of `bbox`.
///
/// Every probe reads a small patch on a coarse grid; the most frequent color
/// over all patches wins, ties going to the first color seen. Probes off the
/// page are skipped, and when none lands the fallback color is used.
pub fn sample_color(raster: &Raster, bbox: &Rect, config: &BackgroundConfig) -> [u8; 3] {
    let step = config.probe_step.max(0.1);
    let radius = config.probe_radius.max(0.0);
    let steps = (2.0 * radius / step).floor() as usize;

    let mut samples = Vec::new();
    for probe in probe_points(bbox, config.probe_offset) {
        for i in 0..=steps {
            for j in 0..=steps {
                let x = probe.x - radius + i as f32 * step;
                let y = probe.y - radius + j as f32 * step;
                if let Some(color) = raster.sample(x, y) {
                    samples.push(color);
                }
            }
        }
    }
    most_frequent(samples).unwrap_or(config.fallback_color)
}

/// Erase every block outside an image.
///
/// Colors are sampled from `pristine` so an earlier erasure never bleeds into
/// a later sample. In-image blocks keep their pixels even where an erased
/// box overlaps them.
pub fn synthesize(pristine: Raster, blocks: &[TextBlock], config: &BackgroundConfig) -> Background {
    let protected: Vec<Rect> = blocks.iter().filter(|b| b.is_in_image).map(|b| b.bbox).collect();
    let mut raster = pristine.clone();
    let mut fills = Vec::new();

    for block in blocks.iter().filter(|b| !b.is_in_image) {
        let color = sample_color(&pristine, &block.bbox, config);
        let area = block.bbox.inflate(config.erase_padding);
        let painted = raster.fill_rect(&area, color, &protected);
        log::trace!("Erased block {:?} with {:?} ({} px)", block.id, color, painted);
        fills.push((block.id, color));
    }

    Background { raster, fills }
}
