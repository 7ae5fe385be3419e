//! Batch coordination of adaptation calls.

use super::cache::{fingerprint, AdaptationCache, Fingerprint};
use super::validation::validate_response;
use super::{AdaptationOutcome, AdaptationSource, AdaptedBlock, Adapter, UnchangedReason};
use crate::config::BatchConfig;
use crate::layout::TextBlock;
use rayon::prelude::*;
use std::collections::HashMap;

/// Estimated size of a text in collaborator units.
fn units(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// A text waiting for the collaborator.
#[derive(Debug, Clone)]
struct Pending {
    index: usize,
    fingerprint: Fingerprint,
}

/// Drives an [`Adapter`] in bounded batches with caching and fallback.
///
/// # Example
///
/// ```
/// use pdf_retext::adaptation::{AdaptError, AdaptationCache, BatchCoordinator};
/// use pdf_retext::config::BatchConfig;
/// use std::time::Duration;
///
/// let adapter = |texts: &[String], _: &str| -> Result<Vec<String>, AdaptError> {
///     Ok(texts.iter().map(|t| format!("{}!", t)).collect())
/// };
/// let cache = AdaptationCache::new(100);
/// let config = BatchConfig::default().with_batch_delay(Duration::ZERO);
/// let coordinator = BatchCoordinator::new(&adapter, &cache, &config);
///
/// let texts = vec!["Hello".to_string(), "World".to_string()];
/// let outcomes = coordinator.adapt_texts(&texts, "esl");
/// assert_eq!(outcomes[0].text(), "Hello!");
/// assert_eq!(outcomes[1].text(), "World!");
/// ```
pub struct BatchCoordinator<'a, A: Adapter + ?Sized> {
    adapter: &'a A,
    cache: &'a AdaptationCache,
    config: &'a BatchConfig,
}

impl<'a, A: Adapter + ?Sized> BatchCoordinator<'a, A> {
    /// Create a coordinator.
    pub fn new(adapter: &'a A, cache: &'a AdaptationCache, config: &'a BatchConfig) -> Self {
        Self {
            adapter,
            cache,
            config,
        }
    }

    /// Adapt texts, one outcome per input in input order.
    pub fn adapt_texts(&self, texts: &[String], profile: &str) -> Vec<AdaptationOutcome> {
        let mut outcomes: Vec<Option<AdaptationOutcome>> = vec![None; texts.len()];
        let mut pending: Vec<Pending> = Vec::new();
        let mut first_by_key: HashMap<Fingerprint, usize> = HashMap::new();
        let mut duplicates: Vec<(usize, usize)> = Vec::new();

        for (index, text) in texts.iter().enumerate() {
            if text.chars().filter(|c| !c.is_whitespace()).count() < self.config.min_chars {
                outcomes[index] = Some(AdaptationOutcome::Unchanged {
                    original: text.clone(),
                    reason: UnchangedReason::Blank,
                });
                continue;
            }
            let key = fingerprint(text, profile);
            if let Some(&first) = first_by_key.get(&key) {
                duplicates.push((index, first));
                continue;
            }
            if let Some(cached) = self.cache.get(&key) {
                outcomes[index] = Some(AdaptationOutcome::Adapted {
                    text: cached,
                    source: AdaptationSource::Cache,
                });
            } else {
                pending.push(Pending {
                    index,
                    fingerprint: key.clone(),
                });
            }
            first_by_key.insert(key, index);
        }

        let batches = self.plan_batches(&pending, texts);
        log::debug!(
            "Adapting {} texts for '{}': {} from cache, {} in {} batches",
            texts.len(),
            profile,
            texts.len() - pending.len() - duplicates.len(),
            pending.len(),
            batches.len()
        );

        let wave_size = self.config.max_concurrent_batches.max(1);
        for (wave_index, wave) in batches.chunks(wave_size).enumerate() {
            if wave_index > 0 && !self.config.batch_delay.is_zero() {
                std::thread::sleep(self.config.batch_delay);
            }
            let results: Vec<Vec<(usize, AdaptationOutcome)>> = wave
                .par_iter()
                .map(|batch| self.run_batch(batch, texts, profile))
                .collect();
            for (index, outcome) in results.into_iter().flatten() {
                outcomes[index] = Some(outcome);
            }
        }

        for (index, first) in duplicates {
            outcomes[index] = match outcomes[first].clone() {
                Some(AdaptationOutcome::Unchanged { reason, .. }) => Some(AdaptationOutcome::Unchanged {
                    original: texts[index].clone(),
                    reason,
                }),
                shared => shared,
            };
        }

        outcomes
            .into_iter()
            .zip(texts)
            .map(|(outcome, text)| {
                outcome.unwrap_or_else(|| AdaptationOutcome::Unchanged {
                    original: text.clone(),
                    reason: UnchangedReason::CallFailed("no result".to_string()),
                })
            })
            .collect()
    }

    /// Adapt the text of each block.
    pub fn adapt_blocks(&self, blocks: &[&TextBlock], profile: &str) -> Vec<AdaptedBlock> {
        let texts: Vec<String> = blocks.iter().map(|b| b.text()).collect();
        let outcomes = self.adapt_texts(&texts, profile);
        blocks
            .iter()
            .zip(texts)
            .zip(outcomes)
            .map(|((block, source), outcome)| AdaptedBlock {
                block_id: block.id,
                text: outcome.text().to_string(),
                fingerprint: fingerprint(&source, profile),
                outcome,
            })
            .collect()
    }

    /// Split pending texts into batches bounded by item count and units.
    fn plan_batches(&self, pending: &[Pending], texts: &[String]) -> Vec<Vec<Pending>> {
        let max_items = self.config.max_items.max(1);
        let mut batches: Vec<Vec<Pending>> = Vec::new();
        let mut current: Vec<Pending> = Vec::new();
        let mut current_units = 0;
        for item in pending {
            let item_units = units(&texts[item.index]);
            let full = current.len() >= max_items || current_units + item_units > self.config.max_units;
            if full && !current.is_empty() {
                batches.push(std::mem::take(&mut current));
                current_units = 0;
            }
            current_units += item_units;
            current.push(item.clone());
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }

    fn run_batch(&self, batch: &[Pending], texts: &[String], profile: &str) -> Vec<(usize, AdaptationOutcome)> {
        if batch.len() == 1 {
            return self.run_individually(batch, texts, profile);
        }

        let inputs: Vec<String> = batch.iter().map(|p| texts[p.index].clone()).collect();
        match self.adapter.adapt(&inputs, profile) {
            Ok(answers) if answers.len() != inputs.len() => {
                log::warn!(
                    "Batch answer has {} texts for {} inputs, retrying individually",
                    answers.len(),
                    inputs.len()
                );
                self.run_individually(batch, texts, profile)
            },
            Ok(answers) => {
                let invalid = inputs
                    .iter()
                    .zip(&answers)
                    .filter(|(input, answer)| validate_response(input, answer).is_err())
                    .count();
                if invalid > 0 {
                    log::warn!("{} unusable texts in batch answer, retrying individually", invalid);
                    return self.run_individually(batch, texts, profile);
                }
                batch
                    .iter()
                    .zip(answers)
                    .map(|(item, answer)| {
                        let text = answer.trim().to_string();
                        self.cache.insert(item.fingerprint.clone(), text.clone());
                        let outcome = AdaptationOutcome::Adapted {
                            text,
                            source: AdaptationSource::Batch,
                        };
                        (item.index, outcome)
                    })
                    .collect()
            },
            Err(e) => {
                log::warn!("Batch adaptation failed ({}), retrying individually", e);
                self.run_individually(batch, texts, profile)
            },
        }
    }

    fn run_individually(
        &self,
        batch: &[Pending],
        texts: &[String],
        profile: &str,
    ) -> Vec<(usize, AdaptationOutcome)> {
        batch
            .iter()
            .map(|item| (item.index, self.adapt_one(item, &texts[item.index], profile)))
            .collect()
    }

    fn adapt_one(&self, item: &Pending, text: &str, profile: &str) -> AdaptationOutcome {
        let unchanged = |reason| AdaptationOutcome::Unchanged {
            original: text.to_string(),
            reason,
        };
        match self.adapter.adapt(&[text.to_string()], profile) {
            Ok(mut answers) if answers.len() == 1 => {
                let answer = answers.remove(0);
                match validate_response(text, &answer) {
                    Ok(()) => {
                        let adapted = answer.trim().to_string();
                        self.cache.insert(item.fingerprint.clone(), adapted.clone());
                        AdaptationOutcome::Adapted {
                            text: adapted,
                            source: AdaptationSource::Individual,
                        }
                    },
                    Err(reason) => {
                        log::warn!("Rejected adaptation ({:?}), keeping original text", reason);
                        unchanged(UnchangedReason::Rejected(reason))
                    },
                }
            },
            Ok(answers) => {
                log::warn!("Expected 1 adapted text, got {}", answers.len());
                unchanged(UnchangedReason::CallFailed(format!(
                    "expected 1 text, got {}",
                    answers.len()
                )))
            },
            Err(e) => {
                log::warn!("Adaptation call failed: {}", e);
                unchanged(UnchangedReason::CallFailed(e.to_string()))
            },
        }
    }
}
