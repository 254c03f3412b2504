//! Bounded key/value store with hit/miss accounting.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

/// A size-bounded LRU map guarded by a single lock.
///
/// Every read and write takes the same lock, so a removal is visible to every
/// lookup that starts after it returns.
pub struct BoundedStore<K, V> {
    /// Store name, used in logs.
    name: &'static str,

    /// Cached entries.
    entries: Mutex<LruCache<K, V>>,

    /// Whether the store accepts entries at all.
    enabled: bool,

    /// Configured bound on the number of entries.
    max_size: usize,

    /// Statistics: lookups that found an entry.
    hits: AtomicU64,

    /// Statistics: lookups that found nothing.
    misses: AtomicU64,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedStore<K, V> {
    /// Creates a store holding at most `max_size` entries.
    ///
    /// A store bounded to zero entries behaves like a disabled one: it never
    /// holds anything and never counts lookups.
    pub fn new(name: &'static str, max_size: usize, enabled: bool) -> Self {
        let capacity = NonZeroUsize::new(max_size);
        if enabled && capacity.is_none() {
            tracing::warn!(store = name, "Store bounded to zero entries, caching disabled");
        }
        Self {
            name,
            entries: Mutex::new(LruCache::new(capacity.unwrap_or(NonZeroUsize::MIN))),
            enabled: enabled && capacity.is_some(),
            max_size,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Looks up an entry, counting a hit or a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let found = self.entries.lock().get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Looks up an entry without touching statistics or recency.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries.lock().peek(key).cloned()
    }

    /// Inserts or overwrites an entry, evicting the least recently used one
    /// when the store is full.
    pub fn insert(&self, key: K, value: V) {
        self.insert_if(key, value, || true);
    }

    /// Inserts only if `admit` holds while the store lock is held. Returns
    /// whether the entry was written.
    pub fn insert_if(&self, key: K, value: V, admit: impl FnOnce() -> bool) -> bool {
        if !self.enabled {
            return false;
        }

        let mut entries = self.entries.lock();
        if !admit() {
            return false;
        }
        if let Some((evicted, _)) = entries.push(key.clone(), value)
            && evicted != key
        {
            tracing::trace!(store = self.name, "Evicted least recently used entry");
        }
        true
    }

    /// Removes every entry matching `predicate`. Returns how many were removed.
    pub fn remove_where(&self, mut predicate: impl FnMut(&K, &V) -> bool) -> usize {
        let mut entries = self.entries.lock();
        let doomed: Vec<K> = entries
            .iter()
            .filter(|(key, value)| predicate(*key, *value))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }

    /// Removes every entry. Statistics are left alone.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Zeroes hit/miss counters without touching entries.
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the configured bound.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        StoreStats {
            hits,
            misses,
            hit_rate: format_hit_rate(hits, misses),
            size: self.len(),
            max_size: self.max_size,
        }
    }
}

impl<K, V> std::fmt::Debug for BoundedStore<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedStore")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

/// Snapshot of one store's statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of lookups that found an entry.
    pub hits: u64,

    /// Number of lookups that found nothing.
    pub misses: u64,

    /// `hits / (hits + misses)` as a percentage with two decimals, `"0.00%"`
    /// before the first lookup.
    pub hit_rate: String,

    /// Number of entries in the store.
    pub size: usize,

    /// Bound on the number of entries.
    pub max_size: usize,
}

fn format_hit_rate(hits: u64, misses: u64) -> String {
    let total = hits + misses;
    if total == 0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", hits as f64 / total as f64 * 100.0)
}
