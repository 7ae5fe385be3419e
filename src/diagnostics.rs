//! Quality diagnostics for a produced document.
//!
//! Compares an original PDF with its rebuilt counterpart. The checks are
//! heuristics for regression tracking: a metric that cannot be computed is
//! reported as `None`, and diagnosing never fails.

use crate::content::interpret_page;
use crate::document::SourceDocument;
use crate::extractors::extract_blocks;
use crate::geometry::Point;
use crate::layout::TextBlock;
use crate::rendering::{PageRenderer, Raster};
use image::imageops::{self, FilterType};
use serde::Serialize;

/// Centers closer than this are a very close match (points).
pub const VERY_CLOSE_DISTANCE: f32 = 10.0;

/// Centers closer than this are a reasonably close match (points).
pub const REASONABLY_CLOSE_DISTANCE: f32 = 50.0;

/// Settings for [`diagnose_with_config`].
#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    /// Pixels per point of the comparison rasters
    pub scale: f32,
    /// Pages compared pixel by pixel
    pub visual_pages: usize,
    /// Pages whose block positions are compared
    pub alignment_pages: usize,
    /// Pages sampled for font sizes
    pub font_pages: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            scale: 0.25,
            visual_pages: 3,
            alignment_pages: 3,
            font_pages: 5,
        }
    }
}

/// How well block positions survived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignmentScore {
    /// Original blocks with a produced block within 10 pt
    pub very_close: usize,
    /// Original blocks with a produced block within 50 pt
    pub reasonably_close: usize,
    /// Original blocks without a produced block nearby
    pub far: usize,
    /// Average per-page score in `[0, 1]`
    pub score: f32,
}

/// Diagnostics of one original/produced pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityMetrics {
    /// Whether both documents have the same number of pages
    pub page_count_match: bool,
    /// `1 - mean absolute pixel difference / 255` over the compared pages
    pub visual_similarity: Option<f32>,
    /// Block position agreement
    pub block_alignment: Option<AlignmentScore>,
    /// Average produced font size minus average original font size
    pub font_size_delta: Option<f32>,
    /// Mean of the available scores in `[0, 1]`
    pub overall_score: f32,
}

/// Diagnose with default settings.
pub fn diagnose(original: &SourceDocument, produced: &SourceDocument) -> QualityMetrics {
    diagnose_with_config(original, produced, &DiagnosticsConfig::default())
}

/// Diagnose two documents given as bytes. Unreadable input yields metrics
/// with every optional value unset.
pub fn diagnose_bytes(original: &[u8], produced: &[u8]) -> QualityMetrics {
    match (SourceDocument::from_bytes(original), SourceDocument::from_bytes(produced)) {
        (Ok(original), Ok(produced)) => diagnose(&original, &produced),
        (original, produced) => {
            if let Err(e) = &original {
                log::warn!("Original document unreadable: {}", e);
            }
            if let Err(e) = &produced {
                log::warn!("Produced document unreadable: {}", e);
            }
            unavailable()
        },
    }
}

fn unavailable() -> QualityMetrics {
    QualityMetrics {
        page_count_match: false,
        visual_similarity: None,
        block_alignment: None,
        font_size_delta: None,
        overall_score: 0.0,
    }
}

/// Diagnose with explicit settings.
pub fn diagnose_with_config(
    original: &SourceDocument,
    produced: &SourceDocument,
    config: &DiagnosticsConfig,
) -> QualityMetrics {
    let page_count_match = original.page_count() == produced.page_count();
    let visual_similarity = visual_similarity(original, produced, config);
    let block_alignment = block_alignment(original, produced, config.alignment_pages);
    let font_size_delta = font_size_delta(original, produced, config.font_pages);

    let mut scores = vec![if page_count_match { 1.0 } else { 0.0 }];
    scores.extend(visual_similarity);
    scores.extend(block_alignment.map(|a| a.score));
    let overall_score = scores.iter().sum::<f32>() / scores.len() as f32;

    let metrics = QualityMetrics {
        page_count_match,
        visual_similarity,
        block_alignment,
        font_size_delta,
        overall_score,
    };
    log::debug!("Quality metrics: {:?}", metrics);
    metrics
}

fn page_blocks(doc: &SourceDocument, index: usize) -> Option<Vec<TextBlock>> {
    let page = doc.page(index)?;
    match interpret_page(doc, page) {
        Ok(scene) => Some(extract_blocks(&scene)),
        Err(e) => {
            log::debug!("Diagnostics: page {} not interpretable: {}", index, e);
            None
        },
    }
}

fn page_raster(doc: &SourceDocument, index: usize, scale: f32) -> Option<Raster> {
    let page = doc.page(index)?;
    let scene = interpret_page(doc, page).ok()?;
    PageRenderer::new().render(&scene, scale).ok()
}

fn visual_similarity(
    original: &SourceDocument,
    produced: &SourceDocument,
    config: &DiagnosticsConfig,
) -> Option<f32> {
    let pages = original.page_count().min(produced.page_count()).min(config.visual_pages);
    if pages == 0 {
        return None;
    }
    let mut total = 0.0;
    for index in 0..pages {
        let a = page_raster(original, index, config.scale)?;
        let b = page_raster(produced, index, config.scale)?;
        total += raster_similarity(&a, &b)?;
    }
    Some(total / pages as f32)
}

/// `1 - mean absolute channel difference / 255`; the second raster is
/// resized to the first when their sizes differ.
fn raster_similarity(a: &Raster, b: &Raster) -> Option<f32> {
    if a.width() == 0 || a.height() == 0 {
        return None;
    }
    let resized;
    let b_image = if a.image.dimensions() == b.image.dimensions() {
        &b.image
    } else {
        resized = imageops::resize(&b.image, a.width(), a.height(), FilterType::Triangle);
        &resized
    };
    let diff: u64 = a
        .image
        .as_raw()
        .iter()
        .zip(b_image.as_raw())
        .map(|(x, y)| x.abs_diff(*y) as u64)
        .sum();
    let mad = diff as f64 / a.image.as_raw().len() as f64;
    Some((1.0 - mad / 255.0) as f32)
}

fn block_alignment(original: &SourceDocument, produced: &SourceDocument, max_pages: usize) -> Option<AlignmentScore> {
    let pages = original.page_count().min(max_pages);
    let mut result = AlignmentScore {
        very_close: 0,
        reasonably_close: 0,
        far: 0,
        score: 0.0,
    };
    let mut scored_pages = 0;
    for index in 0..pages {
        let original_centers: Vec<Point> = page_blocks(original, index)?.iter().map(TextBlock::center).collect();
        if original_centers.is_empty() {
            continue;
        }
        let produced_centers: Vec<Point> = page_blocks(produced, index)
            .unwrap_or_default()
            .iter()
            .map(TextBlock::center)
            .collect();
        let page = score_centers(&original_centers, &produced_centers);
        result.very_close += page.very_close;
        result.reasonably_close += page.reasonably_close;
        result.far += page.far;
        result.score += page.score;
        scored_pages += 1;
    }
    if scored_pages == 0 {
        return None;
    }
    result.score /= scored_pages as f32;
    Some(result)
}

/// Match every original center to its nearest produced center.
///
/// # Examples
///
/// ```
/// use pdf_retext::diagnostics::score_centers;
/// use pdf_retext::geometry::Point;
///
/// let original = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
/// let produced = [Point::new(3.0, 4.0), Point::new(130.0, 0.0)];
/// let score = score_centers(&original, &produced);
/// assert_eq!((score.very_close, score.reasonably_close, score.far), (1, 1, 0));
/// assert_eq!(score.score, 0.75);
/// ```
pub fn score_centers(original: &[Point], produced: &[Point]) -> AlignmentScore {
    let mut score = AlignmentScore {
        very_close: 0,
        reasonably_close: 0,
        far: 0,
        score: 0.0,
    };
    if original.is_empty() {
        return score;
    }
    for center in original {
        let nearest = produced
            .iter()
            .map(|p| center.distance(p))
            .fold(f32::INFINITY, f32::min);
        if nearest < VERY_CLOSE_DISTANCE {
            score.very_close += 1;
        } else if nearest < REASONABLY_CLOSE_DISTANCE {
            score.reasonably_close += 1;
        } else {
            score.far += 1;
        }
    }
    score.score = (score.very_close as f32 + 0.5 * score.reasonably_close as f32) / original.len() as f32;
    score
}

fn average_font_size(doc: &SourceDocument, max_pages: usize) -> Option<f32> {
    let mut total = 0.0;
    let mut count = 0usize;
    for index in 0..doc.page_count().min(max_pages) {
        for block in page_blocks(doc, index).unwrap_or_default() {
            for span in block.spans() {
                total += span.size;
                count += 1;
            }
        }
    }
    (count > 0).then(|| total / count as f32)
}

fn font_size_delta(original: &SourceDocument, produced: &SourceDocument, max_pages: usize) -> Option<f32> {
    Some(average_font_size(produced, max_pages)? - average_font_size(original, max_pages)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn raster(color: [u8; 3], w: u32, h: u32) -> Raster {
        Raster {
            image: RgbImage::from_pixel(w, h, Rgb(color)),
            scale: 1.0,
        }
    }

    #[test]
    fn test_identical_rasters() {
        let a = raster([10, 20, 30], 8, 8);
        assert_eq!(raster_similarity(&a, &a.clone()), Some(1.0));
    }

    #[test]
    fn test_opposite_rasters() {
        let white = raster([255, 255, 255], 4, 4);
        let black = raster([0, 0, 0], 4, 4);
        assert_eq!(raster_similarity(&white, &black), Some(0.0));
    }

    #[test]
    fn test_size_mismatch_is_resized() {
        let a = raster([200, 200, 200], 4, 4);
        let b = raster([200, 200, 200], 8, 8);
        let similarity = raster_similarity(&a, &b).unwrap();
        assert!(similarity > 0.99);
    }

    #[test]
    fn test_empty_raster() {
        let a = raster([0, 0, 0], 0, 0);
        assert_eq!(raster_similarity(&a, &a.clone()), None);
    }

    #[test]
    fn test_centers_without_produced_blocks() {
        let score = score_centers(&[Point::new(0.0, 0.0)], &[]);
        assert_eq!(score.far, 1);
        assert_eq!(score.score, 0.0);
    }

    #[test]
    fn test_unreadable_input() {
        let metrics = diagnose_bytes(b"not a pdf", b"neither");
        assert!(!metrics.page_count_match);
        assert_eq!(metrics.visual_similarity, None);
        assert_eq!(metrics.block_alignment, None);
        assert_eq!(metrics.overall_score, 0.0);
    }

    #[test]
    fn test_metrics_serialize() {
        let json = serde_json::to_string(&unavailable()).unwrap();
        assert!(json.contains("\"page_count_match\":false"));
        assert!(json.contains("\"visual_similarity\":null"));
    }
}
