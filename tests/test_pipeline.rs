//! End-to-end tests of the text-replacement pipeline.

mod common;

use common::{hello_world, run, ImageBox, PdfFixture};
use pdf_retext::adaptation::AdaptError;
use pdf_retext::config::{BatchConfig, EngineConfig};
use pdf_retext::content::{interpret_page, PageScene};
use pdf_retext::placement::Placement;
use pdf_retext::rendering::{PageRenderer, Raster, Rasterizer};
use pdf_retext::{DocumentOutcome, Error, SourceDocument, TextReplacementEngine};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

fn quick_config() -> EngineConfig {
    EngineConfig::default().with_batch(BatchConfig::default().with_batch_delay(Duration::ZERO))
}

/// Page texts of a produced document, one string per block.
fn produced_texts<A: pdf_retext::Adapter>(engine: &TextReplacementEngine<A>, pdf: &[u8]) -> Vec<Vec<String>> {
    let produced = SourceDocument::from_bytes(pdf).unwrap();
    engine
        .extract(&produced)
        .pages
        .iter()
        .map(|p| p.blocks.iter().map(|b| b.text()).collect())
        .collect()
}

fn replace_with(answer: &'static str) -> impl Fn(&[String], &str) -> Result<Vec<String>, AdaptError> + Send + Sync {
    move |texts: &[String], _profile: &str| Ok(texts.iter().map(|_| answer.to_string()).collect())
}

mod scenarios {
    use super::*;

    #[test]
    fn test_hello_world_is_replaced_in_place() {
        let source = SourceDocument::from_bytes(&hello_world()).unwrap();
        let seen = Mutex::new(Vec::new());
        let adapter = |texts: &[String], profile: &str| -> Result<Vec<String>, AdaptError> {
            seen.lock().unwrap().push((texts.to_vec(), profile.to_string()));
            Ok(vec!["Hi there".to_string(); texts.len()])
        };
        let engine = TextReplacementEngine::with_config(adapter, quick_config());
        let processed = engine.process(&source, "dyslexia", None).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(vec!["Hello World".to_string()], "dyslexia".to_string())]
        );
        assert_eq!(processed.report.outcome, DocumentOutcome::Adapted);

        let original_block = processed.document.pages[0].blocks[0].clone();
        let background = processed.document.pages[0].background.as_ref().unwrap();
        assert_eq!(background.erased_count(), 1);

        // the erased box is plain paper
        let (x0, y0, x1, y1) = background.raster.pixel_bounds(&original_block.bbox).unwrap();
        for y in y0..y1 {
            for x in x0..x1 {
                assert_eq!(background.raster.image.get_pixel(x, y).0, [255, 255, 255]);
            }
        }

        // the produced document carries only the new text, near the old box
        let produced = SourceDocument::from_bytes(&processed.pdf).unwrap();
        assert_eq!(produced.page_count(), 1);
        let blocks = engine.extract(&produced).pages.remove(0).blocks;
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text(), "Hi there");
        assert!(blocks[0].bbox.intersects(&original_block.bbox.inflate(20.0)));
    }

    #[test]
    fn test_block_inside_image_is_untouched() {
        let bytes = PdfFixture::new()
            .page_with_images(
                vec![run("Caption", 100.0, 600.0, 12.0)],
                vec![ImageBox {
                    x: 50.0,
                    y: 500.0,
                    width: 300.0,
                    height: 200.0,
                    color: [200, 30, 30],
                }],
            )
            .build();
        let source = SourceDocument::from_bytes(&bytes).unwrap();
        let calls = AtomicUsize::new(0);
        let adapter = |texts: &[String], _: &str| -> Result<Vec<String>, AdaptError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.to_vec())
        };
        let engine = TextReplacementEngine::with_config(adapter, quick_config());
        let processed = engine.process(&source, "esl", None).unwrap();

        let page = &processed.document.pages[0];
        assert_eq!(page.blocks.len(), 1);
        assert!(page.blocks[0].is_in_image);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(processed.adaptations.is_empty());
        assert_eq!(processed.report.pages[0].in_image, 1);
        assert_eq!(processed.report.pages[0].erased, 0);
        assert!(processed.report.pages[0].placements.is_empty());

        // the background is exactly the original rendering
        let scene = interpret_page(&source, source.page(0).unwrap()).unwrap();
        let scale = engine.config().render.scale();
        let pristine = PageRenderer::new().without_text().render(&scene, scale).unwrap();
        assert_eq!(page.background.as_ref().unwrap().raster, pristine);

        // the caption is still real text in the produced page
        assert_eq!(produced_texts(&engine, &processed.pdf), vec![vec!["Caption".to_string()]]);
    }

    #[test]
    fn test_caption_in_image_survives_next_to_replaced_text() {
        let bytes = PdfFixture::new()
            .page_with_images(
                vec![
                    run("Caption", 100.0, 600.0, 12.0),
                    run("Plants make food from sunlight", 72.0, 300.0, 12.0),
                ],
                vec![ImageBox {
                    x: 50.0,
                    y: 500.0,
                    width: 300.0,
                    height: 200.0,
                    color: [200, 30, 30],
                }],
            )
            .build();
        let source = SourceDocument::from_bytes(&bytes).unwrap();
        let engine = TextReplacementEngine::with_config(replace_with("Plants use light"), quick_config());
        let processed = engine.process(&source, "esl", None).unwrap();

        let report = &processed.report.pages[0];
        assert_eq!((report.in_image, report.erased), (1, 1));
        assert_eq!(processed.adaptations.len(), 1);

        let texts = produced_texts(&engine, &processed.pdf).remove(0);
        assert!(texts.contains(&"Caption".to_string()), "{:?}", texts);
        assert!(texts.contains(&"Plants use light".to_string()), "{:?}", texts);

        // the caption keeps its place over the image
        let produced = SourceDocument::from_bytes(&processed.pdf).unwrap();
        let caption = engine
            .extract(&produced)
            .pages
            .remove(0)
            .blocks
            .into_iter()
            .find(|b| b.text() == "Caption")
            .unwrap();
        let original = processed.document.pages[0]
            .blocks
            .iter()
            .find(|b| b.is_in_image)
            .unwrap();
        assert!((caption.bbox.x0 - original.bbox.x0).abs() < 1.0);
        assert!((caption.bbox.y1 - original.bbox.y1).abs() < 4.0);
    }

    #[test]
    fn test_long_text_falls_through_to_manual_wrap() {
        let bytes = PdfFixture::new()
            .sized_page(200.0, 100.0, vec![run("Hello World", 20.0, 20.0, 14.0)], Vec::new())
            .build();
        let source = SourceDocument::from_bytes(&bytes).unwrap();
        let long = "word ".repeat(120);
        let adapter = move |texts: &[String], _: &str| -> Result<Vec<String>, AdaptError> {
            Ok(vec![long.clone(); texts.len()])
        };
        let engine = TextReplacementEngine::with_config(adapter, quick_config());
        let processed = engine.process(&source, "esl", None).unwrap();

        let placements = &processed.report.pages[0].placements;
        assert_eq!(placements.len(), 1);
        match placements[0].1 {
            Placement::ManualWrap { lines, truncated } => {
                assert!(lines > 1);
                assert!(truncated);
            },
            other => panic!("expected manual wrap, got {:?}", other),
        }

        // no produced line starts below the page plus one wrapped line
        let produced = SourceDocument::from_bytes(&processed.pdf).unwrap();
        let blocks = engine.extract(&produced).pages.remove(0).blocks;
        assert!(!blocks.is_empty());
        for block in &blocks {
            for line in &block.lines {
                assert!(line.bbox.y0 < 100.0 + 14.0 * 1.2);
            }
        }
    }
}

mod outcomes {
    use super::*;

    #[test]
    fn test_failed_adaptation_keeps_original_text() {
        let source = SourceDocument::from_bytes(&hello_world()).unwrap();
        let adapter = |_: &[String], _: &str| -> Result<Vec<String>, AdaptError> { Err(AdaptError::Timeout) };
        let engine = TextReplacementEngine::with_config(adapter, quick_config());
        let processed = engine.process(&source, "esl", None).unwrap();

        assert_eq!(processed.report.outcome, DocumentOutcome::AdaptedWithUnchangedText);
        assert_eq!(processed.report.unchanged, 1);
        assert_eq!(processed.adaptations[0].text, "Hello World");

        let produced = SourceDocument::from_bytes(&processed.pdf).unwrap();
        let blocks = engine.extract(&produced).pages.remove(0).blocks;
        assert_eq!(blocks[0].text(), "Hello World");
    }

    #[test]
    fn test_page_without_text_passes_through() {
        let bytes = PdfFixture::new()
            .page_with_images(
                Vec::new(),
                vec![ImageBox {
                    x: 0.0,
                    y: 0.0,
                    width: 612.0,
                    height: 792.0,
                    color: [10, 120, 10],
                }],
            )
            .build();
        let source = SourceDocument::from_bytes(&bytes).unwrap();
        let engine = TextReplacementEngine::with_config(replace_with("unused"), quick_config());
        let processed = engine.process(&source, "esl", None).unwrap();

        assert_eq!(processed.report.outcome, DocumentOutcome::Adapted);
        assert!(processed.document.pages[0].blocks.is_empty());

        // the original image XObject is carried over rather than a rendering of it
        let produced = SourceDocument::from_bytes(&processed.pdf).unwrap();
        assert_eq!(produced.page_count(), 1);
        let content = |doc: &SourceDocument| doc.page_content(doc.page(0).unwrap()).unwrap();
        assert_eq!(content(&produced), content(&source));
        assert!(produced.page_resources(produced.page(0).unwrap()).unwrap().get(b"XObject").is_ok());
    }

    #[test]
    fn test_broken_content_is_contained_to_its_page() {
        let bytes = PdfFixture::new()
            .page(vec![run("First page", 72.0, 700.0, 12.0)])
            .raw_page(b"BT /F1 12 Tf 72 700 Td (unterminated")
            .build();
        let source = SourceDocument::from_bytes(&bytes).unwrap();
        let engine = TextReplacementEngine::with_config(replace_with("Replaced"), quick_config());
        let processed = engine.process(&source, "esl", None).unwrap();

        assert_eq!(processed.report.pages.len(), 2);
        assert_eq!(SourceDocument::from_bytes(&processed.pdf).unwrap().page_count(), 2);
        assert!(processed.report.pages[0].error.is_none());
        assert_eq!(processed.report.pages[0].placements.len(), 1);
        // the second page either decodes partially or is reported, but never aborts the run
        if let Some(error) = &processed.report.pages[1].error {
            assert!(!error.is_empty());
            assert_eq!(processed.report.outcome, DocumentOutcome::AdaptedWithUnchangedText);
        }
    }

    /// Rasterizes every page but the second.
    struct SecondPageFails;

    impl Rasterizer for SecondPageFails {
        fn rasterize(&self, scene: &PageScene, scale: f32) -> pdf_retext::Result<Raster> {
            if scene.page.index == 1 {
                return Err(Error::Render("out of memory".to_string()));
            }
            PageRenderer::new().without_text().render(scene, scale)
        }
    }

    #[test]
    fn test_failed_page_is_copied_from_the_source() {
        let bytes = PdfFixture::new()
            .page(vec![run("First page", 72.0, 700.0, 12.0)])
            .page(vec![run("Second page", 72.0, 700.0, 12.0)])
            .build();
        let source = SourceDocument::from_bytes(&bytes).unwrap();
        let seen = Mutex::new(Vec::new());
        let adapter = |texts: &[String], _: &str| -> Result<Vec<String>, AdaptError> {
            seen.lock().unwrap().extend(texts.iter().cloned());
            Ok(vec!["Replaced".to_string(); texts.len()])
        };
        let engine = TextReplacementEngine::with_config(adapter, quick_config()).with_rasterizer(SecondPageFails);
        let processed = engine.process(&source, "esl", None).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["First page".to_string()]);
        assert_eq!(processed.report.outcome, DocumentOutcome::AdaptedWithUnchangedText);
        assert!(processed.report.pages[0].error.is_none());
        let error = processed.report.pages[1].error.as_deref().unwrap();
        assert!(error.contains("out of memory"), "{}", error);
        assert!(processed.report.pages[1].placements.is_empty());

        assert_eq!(
            produced_texts(&engine, &processed.pdf),
            vec![vec!["Replaced".to_string()], vec!["Second page".to_string()]]
        );
    }

    #[test]
    fn test_garbage_input_is_an_error() {
        assert!(SourceDocument::from_bytes(b"%PDF-1.4 garbage").is_err());
    }
}

mod progress_and_output {
    use super::*;

    #[test]
    fn test_progress_stages_in_order() {
        let source = SourceDocument::from_bytes(&hello_world()).unwrap();
        let engine = TextReplacementEngine::with_config(replace_with("Hi"), quick_config());
        let stages = Mutex::new(Vec::new());
        let progress: &dyn Fn(&str, u8) = &|stage, pct| stages.lock().unwrap().push((stage.to_string(), pct));
        engine.process(&source, "esl", Some(progress)).unwrap();

        let stages = stages.into_inner().unwrap();
        assert_eq!(
            stages,
            vec![
                ("extraction".to_string(), 25),
                ("background".to_string(), 50),
                ("adaptation".to_string(), 75),
                ("placement".to_string(), 100),
            ]
        );
    }

    #[test]
    fn test_rotation_and_page_count_preserved() {
        let mut doc = PdfFixture::new()
            .page(vec![run("One", 72.0, 700.0, 12.0)])
            .page(vec![run("Two", 72.0, 700.0, 12.0)])
            .build_document();
        let second = doc.get_pages()[&2];
        doc.get_object_mut(second)
            .and_then(|o| o.as_dict_mut())
            .unwrap()
            .set("Rotate", 90i64);
        let source = SourceDocument::from_document(doc).unwrap();
        let engine = TextReplacementEngine::with_config(replace_with("Changed"), quick_config());
        let processed = engine.process(&source, "esl", None).unwrap();

        let produced = SourceDocument::from_bytes(&processed.pdf).unwrap();
        assert_eq!(produced.page_count(), 2);
        assert_eq!(produced.page(0).unwrap().rotation, 0);
        assert_eq!(produced.page(1).unwrap().rotation, 90);
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adapted.pdf");
        let source = SourceDocument::from_bytes(&hello_world()).unwrap();
        let engine = TextReplacementEngine::with_config(replace_with("Hi"), quick_config());
        let processed = engine.process(&source, "esl", None).unwrap();
        processed.save(&path).unwrap();

        let reopened = SourceDocument::open(&path).unwrap();
        assert_eq!(reopened.page_count(), 1);
    }

    #[test]
    fn test_report_serializes() {
        let source = SourceDocument::from_bytes(&hello_world()).unwrap();
        let engine = TextReplacementEngine::with_config(replace_with("Hi"), quick_config());
        let processed = engine.process(&source, "esl", None).unwrap();
        let json = serde_json::to_value(&processed.report).unwrap();
        assert_eq!(json["outcome"], "Adapted");
        assert_eq!(json["pages"][0]["blocks"], 1);
    }
}

mod properties {
    use super::*;

    #[test]
    fn test_extraction_is_idempotent() {
        let bytes = PdfFixture::new()
            .page(vec![
                run("Title line", 72.0, 720.0, 18.0),
                run("First paragraph line", 72.0, 650.0, 11.0),
                run("second paragraph line", 72.0, 637.0, 11.0),
            ])
            .build();
        let source = SourceDocument::from_bytes(&bytes).unwrap();
        let engine = TextReplacementEngine::new(replace_with("x"));

        let first = engine.extract(&source);
        let second = engine.extract(&source);
        let summary = |doc: &pdf_retext::layout::Document| -> Vec<(String, pdf_retext::geometry::Rect, bool)> {
            doc.blocks().map(|b| (b.text(), b.bbox, b.is_in_image)).collect()
        };
        assert_eq!(summary(&first), summary(&second));
        assert!(first.blocks().count() >= 2);
    }

    #[test]
    fn test_second_run_is_served_from_cache() {
        let source = SourceDocument::from_bytes(&hello_world()).unwrap();
        let calls = AtomicUsize::new(0);
        let adapter = |texts: &[String], _: &str| -> Result<Vec<String>, AdaptError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["Hi there".to_string(); texts.len()])
        };
        let engine = TextReplacementEngine::with_config(adapter, quick_config());
        engine.process(&source, "esl", None).unwrap();
        let second = engine.process(&source, "esl", None).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.report.cache.hits, 1);
        assert_eq!(second.adaptations[0].text, "Hi there");
    }
}
