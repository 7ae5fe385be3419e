//! Image region detection.
//!
//! Regions are the page-space rectangles of placed image XObjects and of
//! large filled vector rectangles (colored boxes used as image placeholders).

use crate::config::ClassifierConfig;
use crate::content::{PageScene, SceneItem};
use crate::geometry::Rect;
use serde::Serialize;

/// Origin of an image region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegionKind {
    /// A placed image XObject or inline image
    Image,
    /// A large filled rectangle
    VectorFill,
}

/// A rectangle treated as pictorial content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRegion {
    /// Rectangle in top-left page coordinates
    pub rect: Rect,
    /// Where the region came from
    pub kind: RegionKind,
}

/// Collect the image regions of a page in content order.
///
/// Vector fills qualify when both sides exceed `min_region_side` and they
/// cover less than `max_page_coverage` of the page, so full-page background
/// fills do not swallow every block.
pub fn find_image_regions(scene: &PageScene, config: &ClassifierConfig) -> Vec<ImageRegion> {
    let page_area = scene.page.width() * scene.page.height();
    let mut regions = Vec::new();
    for item in &scene.items {
        match item {
            SceneItem::Image(image) => {
                let rect = image.rect(&scene.page);
                if !rect.is_empty() {
                    regions.push(ImageRegion {
                        rect,
                        kind: RegionKind::Image,
                    });
                }
            },
            SceneItem::Path(path) => {
                for rect in path.filled_rects(&scene.page) {
                    let large =
                        rect.width() > config.min_region_side && rect.height() > config.min_region_side;
                    let background =
                        page_area > 0.0 && rect.area() / page_area >= config.max_page_coverage;
                    if large && !background {
                        regions.push(ImageRegion {
                            rect,
                            kind: RegionKind::VectorFill,
                        });
                    }
                }
            },
            SceneItem::Text(_) => {},
        }
    }
    log::trace!("Page {}: {} image regions", scene.page.index, regions.len());
    regions
}
