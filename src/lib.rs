// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # pdf_retext
//!
//! Structural PDF text replacement: take an existing PDF, erase its text
//! while keeping every image, fill and piece of vector art, and put
//! replacement text back in the same places at a plausible font and size.
//!
//! ## Pipeline
//!
//! - **Extraction**: content streams are interpreted into a display list;
//!   glyphs are grouped into spans, lines and blocks
//! - **Classification**: blocks lying at least half inside an image or a
//!   large filled rectangle are left alone
//! - **Background**: each page is rasterized and the remaining blocks are
//!   painted over with colors sampled next to them
//! - **Adaptation**: block texts are rewritten by a caller-supplied
//!   [`Adapter`](adaptation::Adapter), batched and cached
//! - **Placement**: adapted texts are fitted back with a three-step
//!   cascade (exact geometry, auto-fit box, manual wrap)
//! - **Diagnostics**: an original/produced pair can be scored for
//!   regression tracking
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_retext::adaptation::AdaptError;
//! use pdf_retext::{SourceDocument, TextReplacementEngine};
//!
//! # fn main() -> pdf_retext::Result<()> {
//! let simplify = |texts: &[String], _profile: &str| -> Result<Vec<String>, AdaptError> {
//!     Ok(texts.iter().map(|t| t.replace("photosynthesis", "how plants make food")).collect())
//! };
//! let engine = TextReplacementEngine::new(simplify);
//! let source = SourceDocument::open("lesson.pdf")?;
//! let processed = engine.process(&source, "esl", None)?;
//! println!("{:?}", processed.report.outcome);
//! processed.save("lesson_esl.pdf")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Source documents and content interpretation
pub mod content;
pub mod document;
pub mod fonts;

// Layout analysis
pub mod extractors;
pub mod geometry;
pub mod layout;

// Page rasterization and background synthesis
pub mod background;
pub mod rendering;

// Text adaptation
pub mod adaptation;

// Placement and output
pub mod placement;
pub mod writer;

// Configuration
pub mod config;

// Pipeline
pub mod engine;

// Quality checks
pub mod diagnostics;

// Re-exports
pub use adaptation::{AdaptError, AdaptationCache, Adapter};
pub use config::EngineConfig;
pub use diagnostics::{diagnose, QualityMetrics};
pub use document::SourceDocument;
pub use engine::{DocumentOutcome, ProcessedDocument, ProcessingReport, TextReplacementEngine};
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
