//! The text-replacement pipeline.
//!
//! [`TextReplacementEngine::process`] runs the stages in order:
//!
//! 1. **extraction**: interpret every page, group text into blocks and flag
//!    blocks lying inside images
//! 2. **background**: rasterize each page and erase the non-image blocks
//! 3. **adaptation**: send block texts to the collaborator in batches
//! 4. **placement**: place the adapted texts and write the output PDF
//!
//! The progress callback is invoked once after each stage with the stage
//! name and 25, 50, 75 or 100. Page-scoped failures never abort the
//! document; the original page is copied to the output unchanged and the
//! failure recorded in the [`ProcessingReport`]. Pages with nothing to
//! replace are copied the same way.

use crate::adaptation::{AdaptationCache, AdaptedBlock, Adapter, BatchCoordinator, CacheStats};
use crate::background::{synthesize, Background};
use crate::config::EngineConfig;
use crate::content::{interpret_page, PageScene};
use crate::document::{PageInfo, SourceDocument};
use crate::error::{Error, Result};
use crate::extractors::{extract_blocks, find_image_regions};
use crate::geometry::Rect;
use crate::layout::{classify_blocks, BlockId, Document, Page, TextBlock};
use crate::placement::{PageCanvas, Placement, PlacementEngine};
use crate::rendering::{Raster, Rasterizer, SkiaRasterizer};
use crate::writer::PdfWriter;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Progress callback: stage name and percentage.
pub type ProgressFn<'a> = &'a dyn Fn(&str, u8);

/// Overall result of processing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentOutcome {
    /// Every page rebuilt and every text adapted
    Adapted,
    /// Output produced, but some text kept its original wording or some
    /// pages were copied unchanged after a failure
    AdaptedWithUnchangedText,
    /// No page could be rebuilt
    Failed,
}

/// What happened on one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    /// Zero-based page index
    pub index: usize,
    /// Blocks extracted
    pub blocks: usize,
    /// Blocks inside images (left untouched)
    pub in_image: usize,
    /// Blocks erased from the background
    pub erased: usize,
    /// Placement of each replaced block
    pub placements: Vec<(BlockId, Placement)>,
    /// Reason the page was copied from the source unchanged
    pub error: Option<String>,
}

/// Summary of a processing run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingReport {
    /// Overall outcome
    pub outcome: DocumentOutcome,
    /// Per-page details
    pub pages: Vec<PageReport>,
    /// Texts adapted
    pub adapted: usize,
    /// Texts kept because the collaborator failed or answered unusably
    pub unchanged: usize,
    /// Cache counters after the run
    pub cache: CacheStats,
}

/// A rebuilt document.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    /// Extracted tree with synthesized backgrounds
    pub document: Document,
    /// Adaptation of each replaceable block, in page and block order
    pub adaptations: Vec<AdaptedBlock>,
    /// Output PDF bytes
    pub pdf: Vec<u8>,
    /// Run summary
    pub report: ProcessingReport,
}

impl ProcessedDocument {
    /// Write the PDF to `path` atomically (temporary file, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .ok_or_else(|| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")))?;
        let mut tmp_name = std::ffi::OsString::from(".");
        tmp_name.push(file_name);
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        std::fs::write(&tmp, &self.pdf)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        log::debug!("Saved {} bytes to {}", self.pdf.len(), path.display());
        Ok(())
    }
}

/// Per-page state carried between stages.
struct PageWork {
    info: PageInfo,
    blocks: Vec<TextBlock>,
    /// Rendering without text (blank when interpretation failed)
    pristine: Raster,
    background: Background,
    error: Option<String>,
}

/// The structural text-replacement engine.
///
/// # Examples
///
/// ```no_run
/// use pdf_retext::adaptation::AdaptError;
/// use pdf_retext::{SourceDocument, TextReplacementEngine};
///
/// # fn main() -> pdf_retext::Result<()> {
/// let engine = TextReplacementEngine::new(|texts: &[String], _profile: &str| -> Result<Vec<String>, AdaptError> {
///     Ok(texts.iter().map(|t| t.to_uppercase()).collect())
/// });
/// let source = SourceDocument::open("worksheet.pdf")?;
/// let progress: &dyn Fn(&str, u8) = &|stage, pct| println!("{stage}: {pct}%");
/// let processed = engine.process(&source, "dyslexia", Some(progress))?;
/// processed.save("worksheet_adapted.pdf")?;
/// # Ok(())
/// # }
/// ```
pub struct TextReplacementEngine<A: Adapter> {
    adapter: A,
    config: EngineConfig,
    cache: Arc<AdaptationCache>,
    rasterizer: Box<dyn Rasterizer>,
}

impl<A: Adapter> TextReplacementEngine<A> {
    /// Create an engine with default configuration.
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, EngineConfig::default())
    }

    /// Create an engine with custom configuration and its own cache.
    pub fn with_config(adapter: A, config: EngineConfig) -> Self {
        let cache = AdaptationCache::new(config.cache_capacity).with_eviction_fraction(config.cache_eviction_fraction);
        Self {
            adapter,
            config,
            cache: Arc::new(cache),
            rasterizer: Box::new(SkiaRasterizer),
        }
    }

    /// Share a cache with other engines.
    pub fn with_cache(mut self, cache: Arc<AdaptationCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Use a different rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: impl Rasterizer + 'static) -> Self {
        self.rasterizer = Box::new(rasterizer);
        self
    }

    /// The adaptation cache.
    pub fn cache(&self) -> &Arc<AdaptationCache> {
        &self.cache
    }

    /// The configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Extract and classify the text blocks of every page.
    ///
    /// Pages whose content cannot be interpreted come back empty.
    pub fn extract(&self, source: &SourceDocument) -> Document {
        let pages = self
            .interpret(source)
            .into_iter()
            .map(|(info, scene)| {
                let blocks = match &scene {
                    Ok(scene) => self.extract_page(scene),
                    Err(_) => Vec::new(),
                };
                Page {
                    index: info.index,
                    width: info.width(),
                    height: info.height(),
                    rotation: info.rotation,
                    blocks,
                    background: None,
                }
            })
            .collect();
        Document { pages }
    }

    /// Rebuild `source` with text adapted for `profile`.
    ///
    /// Only a document that cannot be written at all is an error; page and
    /// adaptation failures are reported in [`ProcessedDocument::report`].
    pub fn process(
        &self,
        source: &SourceDocument,
        profile: &str,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<ProcessedDocument> {
        let report_progress = |stage: &str, pct: u8| {
            log::debug!("Stage {} done ({}%)", stage, pct);
            if let Some(callback) = progress {
                callback(stage, pct);
            }
        };

        // extraction
        let interpreted: Vec<(PageInfo, Result<PageScene>, Vec<TextBlock>)> = self
            .interpret(source)
            .into_iter()
            .map(|(info, scene)| {
                let blocks = scene.as_ref().map(|s| self.extract_page(s)).unwrap_or_default();
                (info, scene, blocks)
            })
            .collect();
        report_progress("extraction", 25);

        // background
        let mut work: Vec<PageWork> = self.map_pages(interpreted, |(info, scene, blocks)| self.prepare_background(info, scene, blocks));
        report_progress("background", 50);

        // adaptation
        let replaceable: Vec<&TextBlock> = work
            .iter()
            .filter(|w| w.error.is_none())
            .flat_map(|w| w.blocks.iter().filter(|b| !b.is_in_image))
            .collect();
        let coordinator = BatchCoordinator::new(&self.adapter, self.cache.as_ref(), &self.config.batch);
        let adaptations = coordinator.adapt_blocks(&replaceable, profile);
        report_progress("adaptation", 75);

        // placement
        let texts: HashMap<BlockId, &str> = adaptations.iter().map(|a| (a.block_id, a.text.as_str())).collect();
        let placed: Vec<(PageCanvas, Vec<(BlockId, Placement)>, Option<String>)> = work
            .iter()
            .map(|page| self.place_page(page, &texts, profile))
            .collect();

        let mut writer = PdfWriter::new();
        let mut page_reports = Vec::with_capacity(work.len());
        for (page, (canvas, placements, placement_error)) in work.iter_mut().zip(placed) {
            if let Some(reason) = placement_error {
                log::warn!("Page {} is copied unchanged: {}", page.info.index, reason);
                page.background = Background::untouched(page.pristine.clone());
                page.error = Some(reason);
            }
            if page.error.is_some() || !page.blocks.iter().any(|b| !b.is_in_image) {
                // nothing was replaced: the original page goes out as it was
                if let Err(e) = writer.import_page(source, &page.info) {
                    log::warn!("Page {} could not be copied, using its rendering: {}", page.info.index, e);
                    writer.add_page(&canvas, &page.background.raster.image, page.info.rotation)?;
                }
            } else {
                writer.add_page(&canvas, &page.background.raster.image, page.info.rotation)?;
            }
            page_reports.push(PageReport {
                index: page.info.index,
                blocks: page.blocks.len(),
                in_image: page.blocks.iter().filter(|b| b.is_in_image).count(),
                erased: page.background.erased_count(),
                placements: if page.error.is_some() { Vec::new() } else { placements },
                error: page.error.clone(),
            });
        }
        let pdf = writer.finish()?;
        report_progress("placement", 100);

        let report = self.report(page_reports, &adaptations);
        log::debug!(
            "Processed {} pages: {:?}, {} adapted, {} unchanged",
            report.pages.len(),
            report.outcome,
            report.adapted,
            report.unchanged
        );
        let pages = work
            .into_iter()
            .map(|w| Page {
                index: w.info.index,
                width: w.info.width(),
                height: w.info.height(),
                rotation: w.info.rotation,
                blocks: w.blocks,
                background: Some(w.background),
            })
            .collect();
        Ok(ProcessedDocument {
            document: Document { pages },
            adaptations,
            pdf,
            report,
        })
    }

    fn interpret(&self, source: &SourceDocument) -> Vec<(PageInfo, Result<PageScene>)> {
        source
            .pages()
            .iter()
            .map(|info| {
                let scene = interpret_page(source, info);
                if let Err(e) = &scene {
                    log::warn!("Page {} could not be interpreted: {}", info.index, e);
                }
                (info.clone(), scene)
            })
            .collect()
    }

    fn map_pages<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        if self.config.parallel_pages {
            items.into_par_iter().map(f).collect()
        } else {
            items.into_iter().map(f).collect()
        }
    }

    fn extract_page(&self, scene: &PageScene) -> Vec<TextBlock> {
        let mut blocks = extract_blocks(scene);
        let regions: Vec<Rect> = find_image_regions(scene, &self.config.classifier)
            .into_iter()
            .map(|r| r.rect)
            .collect();
        let flagged = classify_blocks(&mut blocks, &regions, self.config.classifier.overlap_threshold);
        log::debug!(
            "Page {}: {} blocks, {} inside {} image regions",
            scene.page.index,
            blocks.len(),
            flagged,
            regions.len()
        );
        blocks
    }

    fn prepare_background(&self, info: PageInfo, scene: Result<PageScene>, blocks: Vec<TextBlock>) -> PageWork {
        let render = &self.config.render;
        let blank = || Raster::blank(info.width(), info.height(), render.scale(), render.paper);
        let (pristine, error) = match scene {
            Ok(scene) => match self.rasterizer.rasterize(&scene, render.scale()) {
                Ok(raster) => (raster, None),
                Err(e) => (blank(), Some(format!("rasterization failed: {}", e))),
            },
            Err(e) => (blank(), Some(e.to_string())),
        };
        let background = if error.is_some() {
            Background::untouched(pristine.clone())
        } else {
            synthesize(pristine.clone(), &blocks, &self.config.background)
        };
        PageWork {
            info,
            blocks,
            pristine,
            background,
            error,
        }
    }

    fn place_page(
        &self,
        page: &PageWork,
        texts: &HashMap<BlockId, &str>,
        profile: &str,
    ) -> (PageCanvas, Vec<(BlockId, Placement)>, Option<String>) {
        let mut canvas = PageCanvas::new(page.info.width(), page.info.height());
        if page.error.is_some() {
            return (canvas, Vec::new(), None);
        }
        let engine = PlacementEngine::new(&self.config.placement);
        let mut placements = Vec::new();
        for block in &page.blocks {
            if block.is_in_image {
                engine.keep_original(&mut canvas, block);
                continue;
            }
            let Some(text) = texts.get(&block.id) else {
                continue;
            };
            match engine.place(&mut canvas, block, text) {
                Ok(placement) => placements.push((block.id, placement)),
                Err(e) => {
                    return (PageCanvas::new(page.info.width(), page.info.height()), Vec::new(), Some(e.to_string()));
                },
            }
        }
        if self.config.placement.badge && !placements.is_empty() {
            engine.badge(&mut canvas, profile);
        }
        (canvas, placements, None)
    }

    fn report(&self, pages: Vec<PageReport>, adaptations: &[AdaptedBlock]) -> ProcessingReport {
        let adapted = adaptations.iter().filter(|a| a.outcome.is_adapted()).count();
        let unchanged = adaptations.iter().filter(|a| a.outcome.is_failure()).count();
        let failed_pages = pages.iter().filter(|p| p.error.is_some()).count();
        let outcome = if !pages.is_empty() && failed_pages == pages.len() {
            DocumentOutcome::Failed
        } else if failed_pages > 0 || unchanged > 0 {
            DocumentOutcome::AdaptedWithUnchangedText
        } else {
            DocumentOutcome::Adapted
        };
        ProcessingReport {
            outcome,
            pages,
            adapted,
            unchanged,
            cache: self.cache.stats(),
        }
    }
}
