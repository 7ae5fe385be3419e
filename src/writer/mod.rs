//! PDF writing module for the produced document.
//!
//! ## Architecture
//!
//! ```text
//! background raster + PageCanvas (placed text)
//!     ↓
//! [ContentStreamBuilder] (image + text → content stream bytes)
//!     ↓
//! [PdfWriter] (assembles pages, fonts and images with lopdf)
//!     ↓
//! PDF bytes
//! ```

mod content_stream;
mod pdf_writer;

pub use content_stream::{ContentStreamBuilder, ContentStreamOp};
pub use pdf_writer::{PdfWriter, PdfWriterConfig};
