//! Tagged-prompt protocol for plain completion services.
//!
//! Many texts travel in one request, each introduced by a `### TEXT N ###`
//! header (1-based). The answer is expected in the same format and is split
//! on those headers; items are matched by ordinal, not by position.

use super::{AdaptError, Adapter};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref RE_TEXT_HEADER: Regex = Regex::new(r"###\s*TEXT\s*(\d+)\s*###").unwrap();
}

/// A service that completes a single prompt.
pub trait Completion: Send + Sync {
    /// Complete `prompt`.
    fn complete(&self, prompt: &str) -> Result<String, AdaptError>;
}

impl<F> Completion for F
where
    F: Fn(&str) -> Result<String, AdaptError> + Send + Sync,
{
    fn complete(&self, prompt: &str) -> Result<String, AdaptError> {
        self(prompt)
    }
}

/// Build the combined request for `texts`.
///
/// # Examples
///
/// ```
/// use pdf_retext::adaptation::build_prompt;
///
/// let prompt = build_prompt(&["Hello".to_string(), "World".to_string()], "esl");
/// assert!(prompt.contains("### TEXT 1 ###\nHello"));
/// assert!(prompt.contains("### TEXT 2 ###\nWorld"));
/// ```
pub fn build_prompt(texts: &[String], profile: &str) -> String {
    let mut prompt = format!(
        "Adapt the following texts for {} readers. Keep the meaning intact. \
         Format your response using exactly '### TEXT N ###' before each adapted text \
         (where N is the text number).\n\n",
        profile
    );
    for (i, text) in texts.iter().enumerate() {
        prompt.push_str(&format!("### TEXT {} ###\n{}\n\n", i + 1, text));
    }
    prompt
}

/// Split a tagged answer into `(index, text)` pairs, 0-based, in index order.
///
/// Headers outside `1..=expected` are ignored; a repeated header keeps its
/// last body.
pub fn parse_response(response: &str, expected: usize) -> Vec<(usize, String)> {
    let headers: Vec<(usize, usize, Option<usize>)> = RE_TEXT_HEADER
        .captures_iter(response)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let ordinal = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok());
            Some((whole.start(), whole.end(), ordinal))
        })
        .collect();

    let mut items = BTreeMap::new();
    for (i, &(_, body_start, ordinal)) in headers.iter().enumerate() {
        let body_end = headers.get(i + 1).map_or(response.len(), |next| next.0);
        let Some(n) = ordinal.filter(|n| (1..=expected).contains(n)) else {
            continue;
        };
        items.insert(n - 1, response[body_start..body_end].trim().to_string());
    }
    items.into_iter().collect()
}

/// An [`Adapter`] over a [`Completion`] service using the tagged protocol.
///
/// A single text is sent as is; several texts are combined. When the answer
/// misses an ordinal the returned list is short, which makes the coordinator
/// retry item by item.
#[derive(Debug, Clone)]
pub struct PromptAdapter<C> {
    completion: C,
}

impl<C: Completion> PromptAdapter<C> {
    /// Wrap a completion service.
    pub fn new(completion: C) -> Self {
        Self { completion }
    }
}

impl<C: Completion> Adapter for PromptAdapter<C> {
    fn adapt(&self, texts: &[String], profile: &str) -> Result<Vec<String>, AdaptError> {
        match texts {
            [] => Ok(Vec::new()),
            [single] => {
                let prompt = format!(
                    "Adapt the following text for {} readers. Keep the meaning intact. \
                     Answer with the adapted text only.\n\n{}",
                    profile, single
                );
                Ok(vec![self.completion.complete(&prompt)?.trim().to_string()])
            },
            _ => {
                let response = self.completion.complete(&build_prompt(texts, profile))?;
                let items = parse_response(&response, texts.len());
                if items.len() != texts.len() {
                    log::warn!("Tagged response has {} of {} items", items.len(), texts.len());
                }
                Ok(items.into_iter().map(|(_, text)| text).collect())
            },
        }
    }
}
