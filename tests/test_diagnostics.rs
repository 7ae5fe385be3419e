//! Tests for quality diagnostics over real documents.

mod common;

use common::{hello_world, run, PdfFixture};
use pdf_retext::adaptation::AdaptError;
use pdf_retext::config::{BatchConfig, EngineConfig};
use pdf_retext::diagnostics::{diagnose_bytes, diagnose_with_config, DiagnosticsConfig};
use pdf_retext::{diagnose, SourceDocument, TextReplacementEngine};
use std::time::Duration;

fn two_paragraphs() -> Vec<u8> {
    PdfFixture::new()
        .page(vec![
            run("Cells are the units of life", 72.0, 700.0, 12.0),
            run("Plants make food from sunlight", 72.0, 500.0, 12.0),
        ])
        .build()
}

#[test]
fn test_identical_documents_score_perfectly() {
    let doc = SourceDocument::from_bytes(&two_paragraphs()).unwrap();
    let metrics = diagnose(&doc, &doc);

    assert!(metrics.page_count_match);
    assert_eq!(metrics.visual_similarity, Some(1.0));
    let alignment = metrics.block_alignment.unwrap();
    assert_eq!(alignment.very_close, 2);
    assert_eq!(alignment.far, 0);
    assert_eq!(alignment.score, 1.0);
    assert_eq!(metrics.font_size_delta, Some(0.0));
    assert_eq!(metrics.overall_score, 1.0);
}

#[test]
fn test_page_count_mismatch_lowers_the_score() {
    let one = SourceDocument::from_bytes(&hello_world()).unwrap();
    let two = SourceDocument::from_bytes(
        &PdfFixture::new()
            .page(vec![run("Hello World", 72.0, 700.0, 12.0)])
            .page(vec![run("Second page", 72.0, 700.0, 12.0)])
            .build(),
    )
    .unwrap();

    let metrics = diagnose(&one, &two);
    assert!(!metrics.page_count_match);
    assert!(metrics.overall_score < 1.0);
}

#[test]
fn test_missing_text_is_far() {
    let original = SourceDocument::from_bytes(&hello_world()).unwrap();
    let blank = SourceDocument::from_bytes(&PdfFixture::new().page(Vec::new()).build()).unwrap();

    let metrics = diagnose(&original, &blank);
    let alignment = metrics.block_alignment.unwrap();
    assert_eq!(alignment.far, 1);
    assert_eq!(alignment.score, 0.0);
    assert_eq!(metrics.font_size_delta, None);
}

#[test]
fn test_processed_output_is_comparable() {
    let bytes = hello_world();
    let source = SourceDocument::from_bytes(&bytes).unwrap();
    let identity = |texts: &[String], _: &str| -> Result<Vec<String>, AdaptError> { Ok(texts.to_vec()) };
    let config = EngineConfig::default().with_batch(BatchConfig::default().with_batch_delay(Duration::ZERO));
    let engine = TextReplacementEngine::with_config(identity, config);
    let processed = engine.process(&source, "esl", None).unwrap();

    let metrics = diagnose_bytes(&bytes, &processed.pdf);
    assert!(metrics.page_count_match);
    assert!(metrics.visual_similarity.unwrap() > 0.5);
    let alignment = metrics.block_alignment.unwrap();
    assert_eq!(alignment.very_close + alignment.reasonably_close, 1);
    assert!(metrics.font_size_delta.is_some());
    assert!(metrics.overall_score > 0.5);

    let json = serde_json::to_value(&metrics).unwrap();
    assert_eq!(json["page_count_match"], true);
    assert!(json["block_alignment"]["score"].is_number());
}

#[test]
fn test_sampled_pages_follow_config() {
    let doc = SourceDocument::from_bytes(&two_paragraphs()).unwrap();
    let config = DiagnosticsConfig {
        visual_pages: 0,
        ..DiagnosticsConfig::default()
    };
    let metrics = diagnose_with_config(&doc, &doc, &config);
    assert_eq!(metrics.visual_similarity, None);
    assert!(metrics.block_alignment.is_some());
}
