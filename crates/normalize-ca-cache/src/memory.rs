use crate::{Fingerprint, MemoCache};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Lookup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Share of lookups served from the cache, `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct Entries {
    values: HashMap<Fingerprint, String>,
    /// Insertion order, oldest first.
    order: VecDeque<Fingerprint>,
}

/// In-process cache bounded by entry count.
///
/// When full, the oldest insertion is evicted. Readers never block each
/// other; a poisoned lock is recovered, since entries are only ever
/// inserted or removed whole.
pub struct MemoryCache {
    entries: RwLock<Entries>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    /// Cache holding at most `max_entries` values (at least one).
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("max_entries", &self.max_entries)
            .field("stats", &self.stats())
            .finish()
    }
}

impl MemoCache for MemoryCache {
    fn get(&self, key: &Fingerprint) -> Option<String> {
        let found = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values
            .get(key)
            .cloned();
        match found {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(%key, "memo hit");
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        found
    }

    fn put(&self, key: Fingerprint, value: String) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.values.insert(key, value).is_some() {
            // Replaced in place; keeps its original slot in the order
            return;
        }
        entries.order.push_back(key);
        while entries.order.len() > self.max_entries {
            if let Some(oldest) = entries.order.pop_front() {
                entries.values.remove(&oldest);
                tracing::trace!(key = %oldest, "memo evicted");
            }
        }
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.values.clear();
        entries.order.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

/// Cache that stores nothing. Every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl MemoCache for NoCache {
    fn get(&self, _key: &Fingerprint) -> Option<String> {
        None
    }

    fn put(&self, _key: Fingerprint, _value: String) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(n: u32) -> Fingerprint {
        Fingerprint::from_bytes(&n.to_le_bytes())
    }

    #[test]
    fn test_get_put_and_stats() {
        let cache = MemoryCache::new(4);
        assert_eq!(cache.get(&key(1)), None);
        cache.put(key(1), "one".to_string());
        assert_eq!(cache.get(&key(1)).as_deref(), Some("one"));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }

    #[test]
    fn test_evicts_oldest_insertion() {
        let cache = MemoryCache::new(2);
        cache.put(key(1), "a".to_string());
        cache.put(key(2), "b".to_string());
        // Overwrite does not refresh position
        cache.put(key(1), "a2".to_string());
        cache.put(key(3), "c".to_string());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key(1)), None);
        assert_eq!(cache.get(&key(2)).as_deref(), Some("b"));
        assert_eq!(cache.get(&key(3)).as_deref(), Some("c"));
    }

    #[test]
    fn test_clear_resets() {
        let cache = MemoryCache::default();
        cache.put(key(7), "x".to_string());
        let _ = cache.get(&key(7));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_no_cache_never_hits() {
        let cache = NoCache;
        cache.put(key(1), "x".to_string());
        assert_eq!(cache.get(&key(1)), None);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(MemoryCache::new(64));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..32 {
                        cache.put(key(i), format!("v{i}"));
                        let _ = cache.get(&key((i + t) % 32));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 32);
        assert_eq!(cache.get(&key(5)).as_deref(), Some("v5"));
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 8 * 32 + 1);
    }
}
