//! Error types for the text-replacement engine.
//!
//! Only failures that abort a whole document surface as [`Error`] from the
//! engine's top-level call. Page-scoped failures are contained and reported,
//! and adaptation failures degrade to the original text (see
//! [`crate::adaptation::AdaptError`]).

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading, rebuilding or writing a PDF.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The PDF object model could not be loaded or navigated
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Invalid PDF structure (missing page tree, bad MediaBox, ...)
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Content stream could not be decoded
    #[error("Content stream error on page {page}: {reason}")]
    Content {
        /// Zero-based page index
        page: usize,
        /// Reason for failure
        reason: String,
    },

    /// Rasterization failed
    #[error("Render error: {0}")]
    Render(String),

    /// Image decoding or encoding failed
    #[error("Image error: {0}")]
    Image(String),

    /// A single page could not be reconstructed
    #[error("Page {page} could not be rebuilt: {reason}")]
    PageFatal {
        /// Zero-based page index
        page: usize,
        /// Reason for failure
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Pdf(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_fatal_error() {
        let err = Error::PageFatal {
            page: 3,
            reason: "no placement strategy succeeded".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Page 3"));
        assert!(msg.contains("no placement strategy"));
    }

    #[test]
    fn test_content_error() {
        let err = Error::Content {
            page: 0,
            reason: "unterminated string".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("page 0"));
        assert!(msg.contains("unterminated string"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.pdf");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(format!("{}", err).contains("missing.pdf"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
