//! Bounded fetch memoization cache.
//!
//! Identical `(start, end)` windows within a session reuse the previous
//! response instead of re-fetching. The cache is an explicit object owned
//! by the caller, with a fixed capacity and FIFO eviction, so memory stays
//! bounded and tests can inject their own instance.

use std::collections::VecDeque;

use crate::models::RawEvent;

/// Default number of distinct fetch windows kept.
/// A dashboard session rarely touches more than a handful of ranges.
pub const DEFAULT_CAPACITY: usize = 32;

/// Memoization key: the formatted start/end bounds exactly as sent to the
/// API.
pub type CacheKey = (String, String);

/// A bounded FIFO cache of fetch results keyed by formatted date bounds.
#[derive(Debug)]
pub struct FetchCache {
    /// Entries, oldest at front
    entries: VecDeque<CacheEntry>,
    /// Maximum number of entries
    capacity: usize,
    /// Lookup hits (for stats)
    hits: u64,
    /// Lookup misses
    misses: u64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    key: CacheKey,
    events: Vec<RawEvent>,
}

impl FetchCache {
    /// Create a cache with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");

        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    /// Create a cache with the default capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Look up a window by exact key.
    pub fn get(&mut self, key: &CacheKey) -> Option<Vec<RawEvent>> {
        match self.entries.iter().find(|e| &e.key == key) {
            Some(entry) => {
                self.hits += 1;
                Some(entry.events.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert a window, evicting the oldest entry at capacity.
    ///
    /// Insert-if-absent: an existing key keeps its original entry.
    pub fn insert(&mut self, key: CacheKey, events: Vec<RawEvent>) {
        if self.entries.iter().any(|e| e.key == key) {
            return;
        }

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }

        self.entries.push_back(CacheEntry { key, events });

        debug_assert!(self.entries.len() <= self.capacity);
    }

    /// Current number of cached windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total lookup hits.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Total lookup misses.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Fraction of lookups served from cache (0.0 to 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Drop all cached windows and reset stats.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(start: &str, end: &str) -> CacheKey {
        (start.to_string(), end.to_string())
    }

    fn sample_events(n: usize) -> Vec<RawEvent> {
        let json = include_str!("../tools/sample_events.json");
        let all: Vec<RawEvent> = serde_json::from_str(json).unwrap();
        all.into_iter().take(n).collect()
    }

    #[test]
    fn test_miss_then_hit() {
        let mut cache = FetchCache::new(4);
        let k = key("2023-02-06 00:00:00", "2023-02-10 23:59:59");

        assert!(cache.get(&k).is_none());
        cache.insert(k.clone(), sample_events(2));
        let cached = cache.get(&k).unwrap();
        assert_eq!(cached.len(), 2);

        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_key_is_exact() {
        let mut cache = FetchCache::new(4);
        cache.insert(key("2023-02-06 00:00:00", "2023-02-10 23:59:59"), vec![]);

        // Same start, different end: a different window entirely.
        assert!(
            cache
                .get(&key("2023-02-06 00:00:00", "2023-02-11 23:59:59"))
                .is_none()
        );
    }

    #[test]
    fn test_bounded_capacity_evicts_oldest() {
        let mut cache = FetchCache::new(2);
        cache.insert(key("a", "a"), vec![]);
        cache.insert(key("b", "b"), vec![]);
        cache.insert(key("c", "c"), vec![]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("a", "a")).is_none());
        assert!(cache.get(&key("b", "b")).is_some());
        assert!(cache.get(&key("c", "c")).is_some());
    }

    #[test]
    fn test_insert_if_absent() {
        let mut cache = FetchCache::new(2);
        cache.insert(key("a", "a"), sample_events(2));
        cache.insert(key("a", "a"), vec![]);

        // First insert wins; the empty overwrite is ignored.
        assert_eq!(cache.get(&key("a", "a")).unwrap().len(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_hit_rate() {
        let mut cache = FetchCache::new(4);
        let k = key("a", "a");

        cache.get(&k); // miss
        cache.insert(k.clone(), vec![]);
        cache.get(&k); // hit
        cache.get(&k); // hit
        cache.get(&key("b", "b")); // miss

        assert!((cache.hit_rate() - 0.5).abs() < 0.01);
    }
}
