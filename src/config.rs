//! Configuration for the text-replacement engine.
//!
//! Every threshold is an empirically tuned default, not a correctness
//! constraint; each can be overridden with the `with_*` builders.

use crate::rendering::RenderOptions;
use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Region classification thresholds.
    pub classifier: ClassifierConfig,

    /// Background erasure parameters.
    pub background: BackgroundConfig,

    /// Adaptation batching limits.
    pub batch: BatchConfig,

    /// Placement cascade parameters.
    pub placement: PlacementConfig,

    /// Page rasterization options.
    pub render: RenderOptions,

    /// Maximum number of cached adaptations.
    pub cache_capacity: usize,

    /// Fraction of the cache evicted at once when it is full.
    pub cache_eviction_fraction: f32,

    /// Process pages on the rayon pool.
    pub parallel_pages: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            background: BackgroundConfig::default(),
            batch: BatchConfig::default(),
            placement: PlacementConfig::default(),
            render: RenderOptions::default(),
            cache_capacity: 2000,
            cache_eviction_fraction: 0.1,
            parallel_pages: true,
        }
    }

    /// Set classifier thresholds.
    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set background erasure parameters.
    pub fn with_background(mut self, background: BackgroundConfig) -> Self {
        self.background = background;
        self
    }

    /// Set batching limits.
    pub fn with_batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    /// Set placement parameters.
    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    /// Set rasterization options.
    pub fn with_render(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    /// Set cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Enable or disable page-level parallelism.
    pub fn with_parallel_pages(mut self, enable: bool) -> Self {
        self.parallel_pages = enable;
        self
    }
}

/// Region classifier thresholds.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Fraction of a block's area that must lie in one region.
    pub overlap_threshold: f32,

    /// Minimum width and height of a vector fill treated as a region.
    pub min_region_side: f32,

    /// Fills covering at least this fraction of the page are backgrounds.
    pub max_page_coverage: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.5,
            min_region_side: 50.0,
            max_page_coverage: 0.9,
        }
    }
}

impl ClassifierConfig {
    /// Set the overlap threshold.
    pub fn with_overlap_threshold(mut self, threshold: f32) -> Self {
        self.overlap_threshold = threshold;
        self
    }
}

/// Background synthesis parameters (page points).
#[derive(Debug, Clone)]
pub struct BackgroundConfig {
    /// Distance of corner probes outside the block.
    pub probe_offset: f32,

    /// Half-size of each probe patch.
    pub probe_radius: f32,

    /// Sampling step inside a probe patch.
    pub probe_step: f32,

    /// Growth of the erased box on every side.
    pub erase_padding: f32,

    /// Fill used when no probe lands on the page.
    pub fallback_color: [u8; 3],
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            probe_offset: 5.0,
            probe_radius: 2.0,
            probe_step: 1.0,
            erase_padding: 1.5,
            fallback_color: [242, 242, 242],
        }
    }
}

/// Adaptation batching limits.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum texts per batch.
    pub max_items: usize,

    /// Maximum estimated units per batch (characters / 4).
    pub max_units: usize,

    /// Texts with fewer non-whitespace characters are never sent.
    pub min_chars: usize,

    /// Batches in flight at once.
    pub max_concurrent_batches: usize,

    /// Pause between waves of batches.
    pub batch_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_items: 5,
            max_units: 4000,
            min_chars: 2,
            max_concurrent_batches: 3,
            batch_delay: Duration::from_millis(100),
        }
    }
}

impl BatchConfig {
    /// Set the item cap.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items.max(1);
        self
    }

    /// Set the unit budget.
    pub fn with_max_units(mut self, max_units: usize) -> Self {
        self.max_units = max_units;
        self
    }

    /// Set the number of concurrent batches.
    pub fn with_max_concurrent_batches(mut self, n: usize) -> Self {
        self.max_concurrent_batches = n.max(1);
        self
    }

    /// Set the delay between waves.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }
}

/// Placement cascade parameters.
#[derive(Debug, Clone)]
pub struct PlacementConfig {
    /// Boxes narrower or shorter than this are expanded.
    pub small_box_threshold: f32,

    /// Minimum width of an expanded small box.
    pub small_box_min_width: f32,

    /// Minimum height of an expanded small box.
    pub small_box_min_height: f32,

    /// Extra width for the exact-geometry retry.
    pub retry_extra_width: f32,

    /// Extra height for the exact-geometry retry.
    pub retry_extra_height: f32,

    /// Font scale for the exact-geometry retry.
    pub retry_scale: f32,

    /// Extra width of the auto-fit box.
    pub autofit_extra_width: f32,

    /// Extra height of the auto-fit box.
    pub autofit_extra_height: f32,

    /// Font sizes tried by the auto-fit strategy.
    pub autofit_sizes: Vec<f32>,

    /// Font scale for manual wrap.
    pub wrap_scale: f32,

    /// Average character width for manual wrap, as a fraction of the size.
    pub wrap_char_width: f32,

    /// Draw a `[Adapted: PROFILE]` badge in the page corner.
    pub badge: bool,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            small_box_threshold: 10.0,
            small_box_min_width: 200.0,
            small_box_min_height: 20.0,
            retry_extra_width: 200.0,
            retry_extra_height: 50.0,
            retry_scale: 0.8,
            autofit_extra_width: 150.0,
            autofit_extra_height: 30.0,
            autofit_sizes: vec![11.0, 9.0, 8.0],
            wrap_scale: 0.9,
            wrap_char_width: 0.5,
            badge: false,
        }
    }
}

impl PlacementConfig {
    /// Enable the profile badge.
    pub fn with_badge(mut self, enable: bool) -> Self {
        self.badge = enable;
        self
    }

    /// Set the auto-fit font sizes.
    pub fn with_autofit_sizes(mut self, sizes: Vec<f32>) -> Self {
        self.autofit_sizes = sizes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.batch.max_items, 5);
        assert_eq!(config.batch.max_units, 4000);
        assert_eq!(config.cache_capacity, 2000);
        assert_eq!(config.placement.autofit_sizes, vec![11.0, 9.0, 8.0]);
        assert_eq!(config.placement.retry_scale, 0.8);
        assert_eq!(config.placement.wrap_scale, 0.9);
        assert_eq!(config.background.fallback_color, [242, 242, 242]);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::new()
            .with_cache_capacity(10)
            .with_parallel_pages(false)
            .with_batch(BatchConfig::default().with_max_items(0).with_batch_delay(Duration::ZERO));
        assert_eq!(config.cache_capacity, 10);
        assert!(!config.parallel_pages);
        assert_eq!(config.batch.max_items, 1);
        assert_eq!(config.batch.batch_delay, Duration::ZERO);
    }
}
