//! Symbol Cache (§4.5): per-file content-hash-keyed cache of overview
//! and find-symbol results, with LRU eviction and file-level
//! invalidation hooks called by every mutating operation.
//!
//! Entries are immutable once inserted; a single mutex protects the map
//! and the LRU order, so eviction happens in the same critical section
//! as insertion.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_CAPACITY: usize = 500;

fn hash_content(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Cache key: a file path plus a fingerprint of the query that produced
/// the cached value (so `find_symbol` and `get_symbols_overview` on the
/// same file never collide).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub relative_path: String,
    pub query_fingerprint: String,
}

impl CacheKey {
    pub fn new(relative_path: impl Into<String>, query_fingerprint: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            query_fingerprint: query_fingerprint.into(),
        }
    }
}

struct Entry {
    content_hash: u64,
    value: Value,
}

/// Running counters exposed via `stats()`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SymbolCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

struct Inner {
    capacity: usize,
    entries: HashMap<CacheKey, Entry>,
    /// Recency order, oldest first. A key can appear at most once; moved
    /// to the back on every access.
    order: VecDeque<CacheKey>,
    stats: SymbolCacheStats,
}

impl Inner {
    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.clone());
    }

    fn evict_if_needed(&mut self) {
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                self.stats.evictions += 1;
            } else {
                break;
            }
        }
    }
}

/// Content-hash-validated cache of symbol-retrieval results, keyed by
/// `(relative_path, query_fingerprint)`.
pub struct SymbolCache {
    inner: Mutex<Inner>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity,
                entries: HashMap::new(),
                order: VecDeque::new(),
                stats: SymbolCacheStats::default(),
            }),
        }
    }

    /// Look up `key`, validating against `current_content`'s hash. A
    /// mismatch evicts the stale entry and counts as a miss, same as a
    /// missing key.
    pub fn get(&self, key: &CacheKey, current_content: &str) -> Option<Value> {
        let mut inner = self.inner.lock();
        let current_hash = hash_content(current_content);

        let hit = match inner.entries.get(key) {
            Some(entry) if entry.content_hash == current_hash => Some(entry.value.clone()),
            _ => None,
        };

        match hit {
            Some(value) => {
                inner.stats.hits += 1;
                inner.touch(key);
                Some(value)
            }
            None => {
                inner.stats.misses += 1;
                if inner.entries.remove(key).is_some() {
                    if let Some(pos) = inner.order.iter().position(|k| k == key) {
                        inner.order.remove(pos);
                    }
                }
                None
            }
        }
    }

    /// Insert `value` for `key`, hashed against `current_content`.
    /// Evicts the least-recently-used entry if this insertion exceeds
    /// capacity.
    pub fn put(&self, key: CacheKey, current_content: &str, value: Value) {
        let mut inner = self.inner.lock();
        let content_hash = hash_content(current_content);

        inner.entries.insert(
            key.clone(),
            Entry {
                content_hash,
                value,
            },
        );
        inner.touch(&key);
        inner.stats.size = inner.entries.len();
        inner.evict_if_needed();
        inner.stats.size = inner.entries.len();
    }

    /// Remove every entry whose key's `relative_path` matches. Returns
    /// the number of entries removed, surfaced as cache-invalidation
    /// metadata on edit responses.
    pub fn invalidate_file(&self, relative_path: &str) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|k, _| k.relative_path != relative_path);
        inner.order.retain(|k| k.relative_path != relative_path);
        inner.stats.size = inner.entries.len();
        before - inner.entries.len()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
        inner.stats.size = 0;
    }

    pub fn stats(&self) -> SymbolCacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats;
        stats.size = inner.entries.len();
        stats
    }
}

impl Default for SymbolCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_then_get_hits_on_unchanged_content() {
        let cache = SymbolCache::new();
        let key = CacheKey::new("a.rs", "find_symbol:Foo");
        cache.put(key.clone(), "fn foo() {}", json!({"name": "foo"}));

        let hit = cache.get(&key, "fn foo() {}");
        assert_eq!(hit, Some(json!({"name": "foo"})));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn content_change_invalidates_entry() {
        let cache = SymbolCache::new();
        let key = CacheKey::new("a.rs", "find_symbol:Foo");
        cache.put(key.clone(), "fn foo() {}", json!({"name": "foo"}));

        let miss = cache.get(&key, "fn foo() { /* changed */ }");
        assert!(miss.is_none());
        assert_eq!(cache.stats().misses, 1);

        // the stale entry was evicted, so a second get on the same
        // (still-changed) content is still a miss, not a stats no-op
        assert!(cache.get(&key, "fn foo() { /* changed */ }").is_none());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn different_queries_on_same_file_do_not_collide() {
        let cache = SymbolCache::new();
        let overview_key = CacheKey::new("a.rs", "get_symbols_overview");
        let find_key = CacheKey::new("a.rs", "find_symbol:Foo");

        cache.put(overview_key.clone(), "content", json!(["Foo", "Bar"]));
        cache.put(find_key.clone(), "content", json!({"name": "Foo"}));

        assert_eq!(cache.get(&overview_key, "content"), Some(json!(["Foo", "Bar"])));
        assert_eq!(cache.get(&find_key, "content"), Some(json!({"name": "Foo"})));
    }

    #[test]
    fn invalidate_file_removes_only_that_files_entries() {
        let cache = SymbolCache::new();
        let a = CacheKey::new("a.rs", "q1");
        let b = CacheKey::new("b.rs", "q1");
        cache.put(a.clone(), "ca", json!(1));
        cache.put(b.clone(), "cb", json!(2));

        let removed = cache.invalidate_file("a.rs");
        assert_eq!(removed, 1);
        assert!(cache.get(&a, "ca").is_none());
        assert_eq!(cache.get(&b, "cb"), Some(json!(2)));
    }

    #[test]
    fn lru_eviction_respects_capacity() {
        let cache = SymbolCache::with_capacity(2);
        cache.put(CacheKey::new("a.rs", "q"), "ca", json!(1));
        cache.put(CacheKey::new("b.rs", "q"), "cb", json!(2));
        cache.put(CacheKey::new("c.rs", "q"), "cc", json!(3));

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.evictions, 1);
        // "a.rs" was least recently used and should be gone
        assert!(cache.get(&CacheKey::new("a.rs", "q"), "ca").is_none());
    }
}
