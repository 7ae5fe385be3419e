//! Bounded adaptation cache.
//!
//! Keys are [`Fingerprint`]s of normalized text plus profile. When the cache
//! is full a fixed fraction of the least recently used entries is evicted in
//! one pass, so eviction cost is paid rarely. All state sits behind one
//! mutex; the cache is safe to share between engine instances and threads.

use lru::LruCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Mutex;

/// Characters of the source text that take part in the fingerprint.
const FINGERPRINT_CHARS: usize = 2000;

/// Cache key: hash of the normalized text plus the lowercased profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint `text` for `profile`.
///
/// The first 2000 characters are whitespace-collapsed and lowercased before
/// hashing, so formatting differences still hit the cache. An empty profile
/// counts as `default`.
///
/// # Examples
///
/// ```
/// use pdf_retext::adaptation::fingerprint;
///
/// assert_eq!(fingerprint("CO2  levels", "ESL"), fingerprint("co2 levels", "esl"));
/// assert_ne!(fingerprint("CO2", "esl"), fingerprint("CO2", "adhd"));
/// assert!(fingerprint("CO2", "").as_str().ends_with("-default"));
/// ```
pub fn fingerprint(text: &str, profile: &str) -> Fingerprint {
    let head: String = text.chars().take(FINGERPRINT_CHARS).collect();
    let normalized = head.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    let profile = if profile.is_empty() {
        "default".to_string()
    } else {
        profile.to_lowercase()
    };
    Fingerprint(format!("{}-{}", hash, profile))
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries held
    pub entries: usize,
    /// Maximum entries
    pub capacity: usize,
    /// Successful lookups
    pub hits: u64,
    /// Failed lookups
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheState {
    entries: LruCache<Fingerprint, String>,
    hits: u64,
    misses: u64,
}

impl Default for CacheState {
    fn default() -> Self {
        Self {
            entries: LruCache::unbounded(),
            hits: 0,
            misses: 0,
        }
    }
}

/// Thread-safe LRU cache of adapted texts.
pub struct AdaptationCache {
    capacity: usize,
    eviction_fraction: f32,
    state: Mutex<CacheState>,
}

impl fmt::Debug for AdaptationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptationCache")
            .field("capacity", &self.capacity)
            .field("eviction_fraction", &self.eviction_fraction)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for AdaptationCache {
    fn default() -> Self {
        Self::new(2000)
    }
}

impl AdaptationCache {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            eviction_fraction: 0.1,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Set the fraction of capacity evicted when the cache is full.
    pub fn with_eviction_fraction(mut self, fraction: f32) -> Self {
        self.eviction_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, CacheState> {
        // the map stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a fingerprint, refreshing its recency.
    pub fn get(&self, key: &Fingerprint) -> Option<String> {
        let mut state = self.state();
        let found = state.entries.get(key).cloned();
        match found {
            Some(_) => state.hits += 1,
            None => state.misses += 1,
        }
        found
    }

    /// Store a text, evicting the least recently used entries when full.
    pub fn insert(&self, key: Fingerprint, text: String) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.state();
        if !state.entries.contains(&key) && state.entries.len() >= self.capacity {
            let count = ((self.capacity as f32 * self.eviction_fraction).ceil() as usize).max(1);
            let mut evicted = 0;
            while evicted < count && state.entries.pop_lru().is_some() {
                evicted += 1;
            }
            log::debug!("Evicted {} cache entries", evicted);
        }
        state.entries.put(key, text);
    }

    /// Whether a fingerprint is cached (does not touch recency or counters).
    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.state().entries.contains(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and reset counters.
    pub fn clear(&self) {
        *self.state() = CacheState::default();
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.state();
        CacheStats {
            entries: state.entries.len(),
            capacity: self.capacity,
            hits: state.hits,
            misses: state.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: usize) -> Fingerprint {
        fingerprint(&format!("text {}", n), "esl")
    }

    #[test]
    fn test_fingerprint_shape() {
        let fp = fingerprint("Hello", "ESL");
        let (hash, profile) = fp.as_str().split_once('-').unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(profile, "esl");
    }

    #[test]
    fn test_fingerprint_ignores_tail_beyond_limit() {
        let base = "a".repeat(2000);
        assert_eq!(
            fingerprint(&format!("{}xyz", base), "p"),
            fingerprint(&format!("{}abc", base), "p")
        );
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = AdaptationCache::new(10);
        assert_eq!(cache.get(&key(1)), None);
        cache.insert(key(1), "one".into());
        assert_eq!(cache.get(&key(1)).as_deref(), Some("one"));
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_batch_eviction_drops_least_recent() {
        let cache = AdaptationCache::new(10);
        for n in 0..10 {
            cache.insert(key(n), n.to_string());
        }
        // refresh 0 so 1 becomes the oldest
        cache.get(&key(0));
        cache.insert(key(10), "ten".into());
        assert_eq!(cache.len(), 10);
        assert!(cache.contains(&key(0)));
        assert!(!cache.contains(&key(1)));
        assert!(cache.contains(&key(10)));
    }

    #[test]
    fn test_eviction_fraction() {
        let cache = AdaptationCache::new(10).with_eviction_fraction(0.5);
        for n in 0..11 {
            cache.insert(key(n), n.to_string());
        }
        assert_eq!(cache.len(), 6);
        assert!(!cache.contains(&key(4)));
        assert!(cache.contains(&key(5)));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = AdaptationCache::new(2);
        cache.insert(key(1), "a".into());
        cache.insert(key(2), "b".into());
        cache.insert(key(2), "c".into());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key(2)).as_deref(), Some("c"));
    }

    #[test]
    fn test_clear_and_zero_capacity() {
        let cache = AdaptationCache::new(0);
        cache.insert(key(1), "x".into());
        assert!(cache.is_empty());

        let cache = AdaptationCache::default();
        cache.insert(key(1), "x".into());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats { capacity: 2000, ..Default::default() });
    }
}
