//! Content-addressed result cache with TTL expiry and LRU eviction.
//!
//! Keys are SHA-256 digests over the normalized request fields, serialized in
//! field-name order so the key does not depend on argument order. Expired
//! entries are dropped lazily on lookup; capacity is enforced on insert by
//! evicting least-recently-used entries before the new entry goes in.
//!
//! All state, including the hit/miss counters and the recency index, sits
//! behind one async mutex so concurrent batch lookups stay consistent.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::models::{CacheConfig, Draft};

/// Build a deterministic key from `(name, value)` pairs.
///
/// Returns `None` if the fields cannot be serialized; callers treat that as a
/// miss and skip caching.
pub fn cache_key<S: AsRef<str>>(fields: &[(&str, S)]) -> Option<String> {
    let ordered: BTreeMap<&str, &str> = fields
        .iter()
        .map(|(name, value)| (*name, value.as_ref()))
        .collect();
    let payload = match serde_json::to_vec(&ordered) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "cache key serialization failed");
            return None;
        }
    };
    let digest = Sha256::digest(&payload);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    Some(hex)
}

/// Key for a draft's normalized `(input_text, goal, constraints)`.
pub fn draft_key(draft: &Draft) -> Option<String> {
    cache_key(&draft.normalized_fields())
}

/// Statistics snapshot from a [`PerformanceCache`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
    pub hit_rate: f64,
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    tick: u64,
}

struct CacheState<V> {
    entries: HashMap<String, Entry<V>>,
    /// Recency tick -> key; the first entry is the least recently used.
    recency: BTreeMap<u64, String>,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl<V: Clone> CacheState<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn get(&mut self, key: &str, ttl: Duration) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() >= ttl,
            None => {
                self.misses += 1;
                return None;
            }
        };
        if expired {
            self.remove(key);
            self.misses += 1;
            return None;
        }

        let tick = self.next_tick();
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.tick);
        entry.tick = tick;
        self.recency.insert(tick, key.to_string());
        self.hits += 1;
        Some(entry.value.clone())
    }

    fn insert(&mut self, key: String, value: V, capacity: usize) {
        let tick = self.next_tick();
        if let Some(entry) = self.entries.get_mut(&key) {
            self.recency.remove(&entry.tick);
            entry.value = value;
            entry.inserted_at = Instant::now();
            entry.tick = tick;
            self.recency.insert(tick, key);
            return;
        }

        while self.entries.len() >= capacity {
            let Some((_, lru)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&lru);
        }

        self.recency.insert(tick, key.clone());
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
                tick,
            },
        );
    }

    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.recency.remove(&entry.tick);
        }
    }

    fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

/// Bounded cache of sampler results.
pub struct PerformanceCache<V> {
    capacity: usize,
    ttl: Duration,
    state: Mutex<CacheState<V>>,
}

impl<V> std::fmt::Debug for PerformanceCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<V: Clone> PerformanceCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            state: Mutex::new(CacheState::new()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_size, config.ttl())
    }

    /// Look up a draft. Misses when the key cannot be built.
    pub async fn get(&self, draft: &Draft) -> Option<V> {
        match draft_key(draft) {
            Some(key) => self.get_key(&key).await,
            None => {
                self.state.lock().await.misses += 1;
                None
            }
        }
    }

    /// Store a value for a draft. Silently skipped when the key cannot be built.
    pub async fn set(&self, draft: &Draft, value: V) {
        if let Some(key) = draft_key(draft) {
            self.set_key(key, value).await;
        }
    }

    pub async fn get_key(&self, key: &str) -> Option<V> {
        self.state.lock().await.get(key, self.ttl)
    }

    pub async fn set_key(&self, key: String, value: V) {
        if self.capacity == 0 {
            return;
        }
        self.state.lock().await.insert(key, value, self.capacity);
    }

    /// `hits / (hits + misses)`, or 0.0 before any lookup.
    pub async fn get_hit_rate(&self) -> f64 {
        self.state.lock().await.hit_rate()
    }

    /// Drop every entry and reset the counters.
    pub async fn clear(&self) {
        self.state.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.len(),
            capacity: self.capacity,
            hit_rate: state.hit_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cache(capacity: usize) -> PerformanceCache<String> {
        PerformanceCache::new(capacity, Duration::from_secs(60))
    }

    #[test]
    fn test_key_is_order_independent() {
        let a = cache_key(&[("goal", "g"), ("input_text", "i")]);
        let b = cache_key(&[("input_text", "i"), ("goal", "g")]);
        assert_eq!(a, b);
        assert_eq!(a.map(|k| k.len()), Some(64));
    }

    #[test]
    fn test_key_ignores_cosmetic_whitespace() {
        let a = draft_key(&Draft::new("fix  the bug", "goal", ""));
        let b = draft_key(&Draft::new(" fix the bug ", "goal", ""));
        assert_eq!(a, b);
        assert_ne!(a, draft_key(&Draft::new("fix the bugs", "goal", "")));
    }

    #[tokio::test]
    async fn test_hit_rate_zero_before_lookups() {
        assert_eq!(cache(4).get_hit_rate().await, 0.0);
    }

    #[tokio::test]
    async fn test_hit_and_miss_counting() {
        let cache = cache(4);
        assert!(cache.get_key("a").await.is_none());
        cache.set_key("a".into(), "va".into()).await;
        assert_eq!(cache.get_key("a").await.as_deref(), Some("va"));
        assert!((cache.get_hit_rate().await - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_lru_eviction_drops_oldest() {
        let cache = cache(3);
        for key in ["a", "b", "c", "d"] {
            cache.set_key(key.into(), key.to_uppercase()).await;
        }
        assert_eq!(cache.len().await, 3);
        assert!(cache.get_key("a").await.is_none());
        assert!(cache.get_key("d").await.is_some());
    }

    #[tokio::test]
    async fn test_lookup_refreshes_recency() {
        let cache = cache(2);
        cache.set_key("a".into(), "A".into()).await;
        cache.set_key("b".into(), "B".into()).await;
        assert!(cache.get_key("a").await.is_some());
        cache.set_key("c".into(), "C".into()).await;
        assert!(cache.get_key("b").await.is_none());
        assert!(cache.get_key("a").await.is_some());
    }

    #[tokio::test]
    async fn test_update_in_place_does_not_evict() {
        let cache = cache(2);
        cache.set_key("a".into(), "A".into()).await;
        cache.set_key("b".into(), "B".into()).await;
        cache.set_key("a".into(), "A2".into()).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get_key("b").await.as_deref(), Some("B"));
        assert_eq!(cache.get_key("a").await.as_deref(), Some("A2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_a_miss() {
        let cache = PerformanceCache::new(4, Duration::from_secs(10));
        cache.set_key("a".to_string(), 1_u32).await;
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(cache.get_key("a").await.is_none());
        assert!(cache.is_empty().await);
        assert_eq!(cache.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_clear_resets_entries_and_counters() {
        let cache = cache(4);
        cache.set_key("a".into(), "A".into()).await;
        cache.get_key("a").await;
        cache.get_key("b").await;
        cache.clear().await;
        let stats = cache.stats().await;
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_never_stores() {
        let cache = cache(0);
        cache.set_key("a".into(), "A".into()).await;
        assert!(cache.is_empty().await);
    }

    proptest! {
        /// Drives the cache with random gets and sets and checks it against a
        /// plain recency list, front = least recently used.
        #[test]
        fn prop_lru_respects_capacity_and_order(
            capacity in 1usize..6,
            ops in proptest::collection::vec((any::<bool>(), 0u8..10), 1..80),
        ) {
            let ttl = Duration::from_secs(3600);
            let mut state: CacheState<u8> = CacheState::new();
            let mut order: Vec<u8> = Vec::new();

            for (is_get, key) in ops {
                let name = key.to_string();
                let position = order.iter().position(|k| *k == key);
                if is_get {
                    let found = state.get(&name, ttl);
                    prop_assert_eq!(found.is_some(), position.is_some());
                    if let Some(i) = position {
                        order.remove(i);
                        order.push(key);
                    }
                } else {
                    let evicted = match position {
                        Some(i) => {
                            order.remove(i);
                            None
                        }
                        None if order.len() >= capacity => Some(order.remove(0)),
                        None => None,
                    };
                    state.insert(name, key, capacity);
                    order.push(key);
                    if let Some(evicted) = evicted {
                        prop_assert!(!state.entries.contains_key(&evicted.to_string()));
                    }
                }

                prop_assert!(state.entries.len() <= capacity);
                prop_assert_eq!(state.entries.len(), order.len());
                for k in &order {
                    prop_assert!(state.entries.contains_key(&k.to_string()));
                }
            }
        }
    }
}
