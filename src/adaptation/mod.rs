//! Text adaptation through an external collaborator.
//!
//! The rewriting engine is a black box `(texts, profile) -> texts` behind the
//! [`Adapter`] trait. The [`BatchCoordinator`] groups texts into bounded
//! batches, consults the shared [`AdaptationCache`], validates every answer
//! and falls back to per-item calls when a batch answer cannot be trusted.
//! Every input text gets exactly one [`AdaptationOutcome`], in input order.

pub mod cache;
pub mod coordinator;
pub mod protocol;
pub(crate) mod validation;

pub use cache::{fingerprint, AdaptationCache, CacheStats, Fingerprint};
pub use coordinator::BatchCoordinator;
pub use protocol::{build_prompt, parse_response, Completion, PromptAdapter};
pub use validation::{validate_response, RejectReason};

use crate::layout::BlockId;
use serde::Serialize;
use thiserror::Error;

/// Failure of one call to the adaptation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdaptError {
    /// The call failed
    #[error("adaptation call failed: {0}")]
    Call(String),

    /// The call did not answer in time
    #[error("adaptation call timed out")]
    Timeout,
}

/// The rewriting collaborator.
///
/// An implementation receives a batch of texts and must answer with one text
/// per input, in order. Shorter or longer answers are tolerated by the
/// coordinator, which then retries item by item.
///
/// Closures implement the trait directly:
///
/// ```
/// use pdf_retext::adaptation::{AdaptError, Adapter};
///
/// let upper = |texts: &[String], _profile: &str| -> Result<Vec<String>, AdaptError> {
///     Ok(texts.iter().map(|t| t.to_uppercase()).collect())
/// };
/// assert_eq!(upper.adapt(&["hi".to_string()], "esl").unwrap(), vec!["HI"]);
/// ```
pub trait Adapter: Send + Sync {
    /// Rewrite `texts` for `profile`.
    fn adapt(&self, texts: &[String], profile: &str) -> Result<Vec<String>, AdaptError>;
}

impl<F> Adapter for F
where
    F: Fn(&[String], &str) -> Result<Vec<String>, AdaptError> + Send + Sync,
{
    fn adapt(&self, texts: &[String], profile: &str) -> Result<Vec<String>, AdaptError> {
        self(texts, profile)
    }
}

/// How an adapted text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdaptationSource {
    /// Served from the cache
    Cache,
    /// Answered as part of a batch
    Batch,
    /// Answered by a single-item call
    Individual,
}

/// Why a text was left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UnchangedReason {
    /// Too short to be worth sending
    Blank,
    /// The collaborator failed
    CallFailed(String),
    /// The collaborator answered with something unusable
    Rejected(RejectReason),
}

/// Result of adapting one text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AdaptationOutcome {
    /// A usable replacement text
    Adapted {
        /// Replacement text
        text: String,
        /// Where it came from
        source: AdaptationSource,
    },
    /// The original text, kept
    Unchanged {
        /// Original text
        original: String,
        /// Why no replacement was used
        reason: UnchangedReason,
    },
}

impl AdaptationOutcome {
    /// The text to place: the replacement or the original.
    pub fn text(&self) -> &str {
        match self {
            AdaptationOutcome::Adapted { text, .. } => text,
            AdaptationOutcome::Unchanged { original, .. } => original,
        }
    }

    /// Whether a replacement was produced.
    pub fn is_adapted(&self) -> bool {
        matches!(self, AdaptationOutcome::Adapted { .. })
    }

    /// Whether the collaborator failed or answered unusably.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            AdaptationOutcome::Unchanged {
                reason: UnchangedReason::CallFailed(_) | UnchangedReason::Rejected(_),
                ..
            }
        )
    }
}

/// An adaptation tied to its block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptedBlock {
    /// Source block
    pub block_id: BlockId,
    /// Text to place
    pub text: String,
    /// Cache key of the source text
    pub fingerprint: Fingerprint,
    /// Full outcome
    pub outcome: AdaptationOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_text() {
        let adapted = AdaptationOutcome::Adapted {
            text: "new".to_string(),
            source: AdaptationSource::Batch,
        };
        assert_eq!(adapted.text(), "new");
        assert!(adapted.is_adapted());
        assert!(!adapted.is_failure());

        let kept = AdaptationOutcome::Unchanged {
            original: "old".to_string(),
            reason: UnchangedReason::CallFailed("boom".to_string()),
        };
        assert_eq!(kept.text(), "old");
        assert!(kept.is_failure());

        let blank = AdaptationOutcome::Unchanged {
            original: " ".to_string(),
            reason: UnchangedReason::Blank,
        };
        assert!(!blank.is_failure());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(AdaptError::Call("503".into()).to_string(), "adaptation call failed: 503");
        assert_eq!(AdaptError::Timeout.to_string(), "adaptation call timed out");
    }
}
