//! Classification of text blocks that sit inside image regions.
//!
//! Text inside a photo or a colored placeholder box is often part of the
//! artwork. Such blocks are flagged so they are neither erased nor replaced.

use super::text_block::TextBlock;
use crate::geometry::Rect;

/// Fraction of `block` covered by `region`.
///
/// A zero-area block counts as fully covered when its center lies in the
/// region and not covered otherwise.
///
/// # Examples
///
/// ```
/// use pdf_retext::geometry::Rect;
/// use pdf_retext::layout::overlap_ratio;
///
/// let block = Rect::new(0.0, 0.0, 100.0, 20.0);
/// assert_eq!(overlap_ratio(&block, &Rect::new(50.0, 0.0, 300.0, 300.0)), 0.5);
/// assert_eq!(overlap_ratio(&block, &Rect::new(200.0, 0.0, 300.0, 300.0)), 0.0);
/// ```
pub fn overlap_ratio(block: &Rect, region: &Rect) -> f32 {
    let area = block.area();
    if area <= 0.0 {
        return if region.contains_point(&block.center()) {
            1.0
        } else {
            0.0
        };
    }
    block
        .intersection(region)
        .map_or(0.0, |overlap| overlap.area() / area)
}

/// Whether a block lies in any single region by at least `threshold`.
///
/// Overlaps with different regions are not summed; a block straddling two
/// images with 30% in each stays outside. A ratio exactly at the threshold
/// counts as inside.
pub fn is_in_image(bbox: &Rect, regions: &[Rect], threshold: f32) -> bool {
    regions
        .iter()
        .any(|region| overlap_ratio(bbox, region) >= threshold)
}

/// Set `is_in_image` on every block.
///
/// Returns the number of blocks flagged.
pub fn classify_blocks(blocks: &mut [TextBlock], regions: &[Rect], threshold: f32) -> usize {
    let mut flagged = 0;
    for block in blocks.iter_mut() {
        block.is_in_image = is_in_image(&block.bbox, regions, threshold);
        if block.is_in_image {
            flagged += 1;
            log::debug!(
                "Block {:?} lies inside an image region, leaving it untouched",
                block.id
            );
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        let block = Rect::new(0.0, 0.0, 100.0, 10.0);
        let half = Rect::new(50.0, -10.0, 200.0, 20.0);
        assert!(is_in_image(&block, &[half], 0.5));

        let less = Rect::new(51.0, -10.0, 200.0, 20.0);
        assert!(!is_in_image(&block, &[less], 0.5));
    }

    #[test]
    fn test_overlaps_are_not_summed() {
        let block = Rect::new(0.0, 0.0, 100.0, 10.0);
        let left = Rect::new(-10.0, -10.0, 30.0, 20.0);
        let right = Rect::new(70.0, -10.0, 120.0, 20.0);
        assert!(!is_in_image(&block, &[left, right], 0.5));
    }

    #[test]
    fn test_degenerate_block_uses_center() {
        let block = Rect::new(10.0, 10.0, 10.0, 30.0);
        assert!(is_in_image(&block, &[Rect::new(0.0, 0.0, 50.0, 50.0)], 0.5));
        assert!(!is_in_image(&block, &[Rect::new(20.0, 0.0, 50.0, 50.0)], 0.5));
    }

    #[test]
    fn test_no_regions() {
        assert!(!is_in_image(&Rect::new(0.0, 0.0, 1.0, 1.0), &[], 0.5));
    }
}
