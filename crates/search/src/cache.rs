//! In-memory result cache with TTL expiry and insertion-order eviction.
//!
//! # Example
//!
//! ```
//! use foodshare_search::SearchCache;
//! use std::time::Duration;
//!
//! let mut cache = SearchCache::new(Duration::from_secs(60), 2);
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.set("c", 3); // evicts "a"
//!
//! assert_eq!(cache.get("a"), None);
//! assert_eq!(cache.get("c"), Some(3));
//! ```

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Cache entry with its creation time
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

/// Bounded TTL cache.
///
/// An entry is served only while `now - created_at < ttl`. When the entry
/// count exceeds `max_entries`, the oldest-inserted entry is evicted.
#[derive(Debug, Clone)]
pub struct SearchCache<V> {
    ttl: Duration,
    max_entries: usize,
    entries: HashMap<String, CacheEntry<V>>,
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

impl<V: Clone> SearchCache<V> {
    /// Create a cache. A `max_entries` of 0 is treated as 1.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Get a fresh value. Stale entries are removed on access.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Store a value. Re-setting a key refreshes both its timestamp and its
    /// insertion position.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.set_at(key.into(), value, Instant::now());
    }

    /// Remove a value. Returns true if it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.order.retain(|k| k != key);
        }
        existed
    }

    /// Clear all cached values.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn prune_expired(&mut self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let before = self.entries.len();

        self.entries.retain(|_, entry| !is_expired(entry.created_at, now, ttl));
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));

        before - self.entries.len()
    }

    /// Number of stored entries (fresh or not yet pruned).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            max_entries: self.max_entries,
            ttl_ms: self.ttl.as_millis() as u64,
            hits: self.hits,
            misses: self.misses,
        }
    }

    pub(crate) fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        let fresh = match self.entries.get(key) {
            Some(entry) => !is_expired(entry.created_at, now, self.ttl),
            None => {
                self.misses += 1;
                return None;
            }
        };

        if !fresh {
            self.remove(key);
            self.misses += 1;
            return None;
        }

        self.hits += 1;
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub(crate) fn set_at(&mut self, key: String, value: V, now: Instant) {
        if self.entries.contains_key(&key) {
            self.order.retain(|k| *k != key);
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, CacheEntry { value, created_at: now });

        while self.entries.len() > self.max_entries {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

fn is_expired(created_at: Instant, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(created_at) >= ttl
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of stored entries
    pub entries: usize,
    /// Entry cap
    pub max_entries: usize,
    /// Entry lifetime in milliseconds
    pub ttl_ms: u64,
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that missed or found a stale entry
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache(max_entries: usize) -> SearchCache<String> {
        SearchCache::new(Duration::from_secs(300), max_entries)
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = test_cache(10);

        cache.set("test_key", "test_value".to_string());
        assert_eq!(cache.get("test_key"), Some("test_value".to_string()));
    }

    #[test]
    fn test_get_missing() {
        let mut cache = test_cache(10);
        assert!(cache.get("nonexistent").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_remove() {
        let mut cache = test_cache(10);

        cache.set("to_remove", "42".to_string());
        assert!(cache.remove("to_remove"));
        assert!(cache.get("to_remove").is_none());
        assert!(!cache.remove("to_remove"));
    }

    #[test]
    fn test_expiry_boundary() {
        let mut cache = SearchCache::new(Duration::from_millis(100), 10);
        let start = Instant::now();
        cache.set_at("q".to_string(), 1, start);

        assert_eq!(cache.get_at("q", start + Duration::from_millis(99)), Some(1));
        // age == ttl is already stale
        assert_eq!(cache.get_at("q", start + Duration::from_millis(100)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expiry_real_clock() {
        let mut cache = SearchCache::new(Duration::from_millis(20), 10);
        cache.set("expires", 1);
        std::thread::sleep(Duration::from_millis(50));

        assert_eq!(cache.prune_expired(), 1);
        assert!(cache.get("expires").is_none());
    }

    #[test]
    fn test_evicts_exactly_the_oldest() {
        let max = 5;
        let mut cache = test_cache(max);
        for i in 0..=max {
            cache.set(format!("query-{i}"), i.to_string());
        }

        assert_eq!(cache.len(), max);
        assert!(cache.get("query-0").is_none());
        for i in 1..=max {
            assert!(cache.get(&format!("query-{i}")).is_some(), "query-{i} should survive");
        }
    }

    #[test]
    fn test_reset_refreshes_insertion_order() {
        let mut cache = test_cache(2);
        cache.set("a", "1".to_string());
        cache.set("b", "2".to_string());
        cache.set("a", "3".to_string());
        cache.set("c", "4".to_string());

        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a"), Some("3".to_string()));
    }

    #[test]
    fn test_stats() {
        let mut cache = test_cache(10);
        cache.set("key1", "value1".to_string());
        cache.set("key2", "value2".to_string());
        cache.get("key1");

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.ttl_ms, 300_000);
    }
}
