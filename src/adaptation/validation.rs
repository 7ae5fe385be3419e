//! Checks on collaborator answers.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Phrases that mark a refusal or an error message when they open an answer.
const REFUSAL_PHRASES: &[&str] = &[
    "I cannot",
    "I can't",
    "I'm sorry",
    "I am not able",
    "I don't have",
    "Unable to",
    "Error:",
    "Failed to",
    "Not possible",
    "Cannot process",
];

/// Only the head of an answer is searched for refusal phrases.
const REFUSAL_WINDOW: usize = 100;

lazy_static! {
    /// `[ESL]`, `[Adapted: ADHD]`
    static ref RE_BRACKET_MARKER: Regex =
        Regex::new(r"(?i)^\[(?:adapted:\s*)?[a-z]+\]$").unwrap();

    /// `Adapted for dyslexia`
    static ref RE_ADAPTED_FOR: Regex = Regex::new(r"(?i)^adapted for \w+$").unwrap();
}

/// Why an answer was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// Empty or whitespace only
    Empty,
    /// A bare profile marker instead of text
    Placeholder,
    /// A refusal or error message
    Refusal,
}

/// Validate an answer for `original`.
///
/// # Examples
///
/// ```
/// use pdf_retext::adaptation::{validate_response, RejectReason};
///
/// assert!(validate_response("Photosynthesis", "Plants make food from light").is_ok());
/// assert_eq!(validate_response("x", "[ESL]"), Err(RejectReason::Placeholder));
/// assert_eq!(validate_response("x", "I'm sorry, I can't"), Err(RejectReason::Refusal));
/// ```
pub fn validate_response(original: &str, adapted: &str) -> Result<(), RejectReason> {
    let trimmed = adapted.trim();
    if trimmed.is_empty() {
        return Err(RejectReason::Empty);
    }
    if is_placeholder(trimmed) {
        return Err(RejectReason::Placeholder);
    }
    let head: String = trimmed.chars().take(REFUSAL_WINDOW).collect();
    if REFUSAL_PHRASES.iter().any(|p| head.contains(p)) {
        return Err(RejectReason::Refusal);
    }

    let original_len = original.trim().chars().count();
    if original_len >= 20 {
        let ratio = trimmed.chars().count() as f32 / original_len as f32;
        if !(0.1..=10.0).contains(&ratio) {
            log::warn!(
                "Adapted text length ratio {:.2} is unusual ({} -> {} chars)",
                ratio,
                original_len,
                trimmed.chars().count()
            );
        }
    }
    Ok(())
}

/// Whether `text` is a bare profile marker.
pub(crate) fn is_placeholder(text: &str) -> bool {
    let text = text.trim();
    RE_BRACKET_MARKER.is_match(text) || RE_ADAPTED_FOR.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        for marker in ["[ESL]", "[adhd]", "[Adapted: ADHD]", "Adapted for dyslexia", " [ESL] "] {
            assert!(is_placeholder(marker), "{marker}");
        }
        assert!(!is_placeholder("[ESL] Plants make food"));
        assert!(!is_placeholder("Adapted for dyslexia readers today"));
    }

    #[test]
    fn test_refusal_only_in_head() {
        assert_eq!(validate_response("a", "Error: quota exceeded"), Err(RejectReason::Refusal));
        let late = format!("{} I cannot", "word ".repeat(30));
        assert!(validate_response("a", &late).is_ok());
    }

    #[test]
    fn test_empty() {
        assert_eq!(validate_response("a", "  \n"), Err(RejectReason::Empty));
    }

    #[test]
    fn test_long_expansion_is_accepted() {
        let original = "A short original sentence.";
        let expanded = "word ".repeat(200);
        assert!(validate_response(original, &expanded).is_ok());
    }
}
